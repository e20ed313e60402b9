//! Programmatic schema builder.
//!
//! Lets route authors declare schemas inline without hand-writing JSON Schema
//! documents. Every node accepts a `.describe(...)` annotation; descriptions
//! survive lowering at every nesting level, so the generated OpenAPI document
//! keeps the author's field documentation.
//!
//! ```
//! use restframe::schema::dsl::TypedSchema;
//!
//! let todo = TypedSchema::object()
//!     .describe("A TODO item")
//!     .field("name", TypedSchema::string().describe("Short label"))
//!     .optional_field("done", TypedSchema::boolean());
//! let descriptor = todo.build().unwrap();
//! ```

use serde_json::{json, Map, Value};

use super::JsonSchema;

#[derive(Debug, Clone)]
enum Kind {
    String,
    Integer,
    Number,
    Boolean,
    Object {
        properties: Vec<(String, TypedSchema)>,
        required: Vec<String>,
    },
    Array(Box<TypedSchema>),
    Enumeration(Vec<Value>),
    OneOf(Vec<TypedSchema>),
}

/// A schema under construction. Lowers to a [`JsonSchema`] descriptor.
#[derive(Debug, Clone)]
pub struct TypedSchema {
    kind: Kind,
    description: Option<String>,
}

impl TypedSchema {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::new(Kind::String)
    }

    pub fn integer() -> Self {
        Self::new(Kind::Integer)
    }

    pub fn number() -> Self {
        Self::new(Kind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(Kind::Boolean)
    }

    pub fn object() -> Self {
        Self::new(Kind::Object {
            properties: Vec::new(),
            required: Vec::new(),
        })
    }

    pub fn array(items: TypedSchema) -> Self {
        Self::new(Kind::Array(Box::new(items)))
    }

    /// A fixed set of allowed values.
    pub fn enumeration<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Self::new(Kind::Enumeration(values.into_iter().collect()))
    }

    /// A union of alternative schemas.
    pub fn one_of<I: IntoIterator<Item = TypedSchema>>(variants: I) -> Self {
        Self::new(Kind::OneOf(variants.into_iter().collect()))
    }

    /// Attach a human-readable description to this node.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a required field. Panics in debug builds if this is not an object.
    pub fn field(mut self, name: impl Into<String>, schema: TypedSchema) -> Self {
        let name = name.into();
        match &mut self.kind {
            Kind::Object {
                properties,
                required,
            } => {
                required.push(name.clone());
                properties.push((name, schema));
            }
            _ => debug_assert!(false, "field() called on a non-object schema"),
        }
        self
    }

    /// Add an optional field.
    pub fn optional_field(mut self, name: impl Into<String>, schema: TypedSchema) -> Self {
        match &mut self.kind {
            Kind::Object { properties, .. } => properties.push((name.into(), schema)),
            _ => debug_assert!(false, "optional_field() called on a non-object schema"),
        }
        self
    }

    /// Lower to a JSON Schema document.
    pub fn to_value(&self) -> Value {
        let mut out = match &self.kind {
            Kind::String => json!({ "type": "string" }),
            Kind::Integer => json!({ "type": "integer" }),
            Kind::Number => json!({ "type": "number" }),
            Kind::Boolean => json!({ "type": "boolean" }),
            Kind::Object {
                properties,
                required,
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.to_value()))
                    .collect();
                let mut obj = json!({
                    "type": "object",
                    "properties": props,
                    "additionalProperties": false,
                });
                if !required.is_empty() {
                    obj["required"] = json!(required);
                }
                obj
            }
            Kind::Array(items) => json!({ "type": "array", "items": items.to_value() }),
            Kind::Enumeration(values) => json!({ "enum": values }),
            Kind::OneOf(variants) => {
                let alts: Vec<Value> = variants.iter().map(TypedSchema::to_value).collect();
                json!({ "oneOf": alts })
            }
        };
        if let Some(desc) = &self.description {
            out["description"] = Value::String(desc.clone());
        }
        out
    }

    /// Compile into a descriptor usable on operations.
    ///
    /// # Errors
    ///
    /// Fails only if the lowered document does not compile, which indicates a
    /// bug in the builder rather than bad user input.
    pub fn build(self) -> anyhow::Result<JsonSchema> {
        JsonSchema::new(self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDescriptor;

    #[test]
    fn test_descriptions_survive_three_nesting_levels() {
        let schema = TypedSchema::object()
            .describe("root")
            .field(
                "items",
                TypedSchema::array(
                    TypedSchema::object()
                        .describe("item")
                        .field("name", TypedSchema::string().describe("item name")),
                )
                .describe("item list"),
            );
        let value = schema.to_value();
        assert_eq!(value["description"], "root");
        assert_eq!(value["properties"]["items"]["description"], "item list");
        assert_eq!(value["properties"]["items"]["items"]["description"], "item");
        assert_eq!(
            value["properties"]["items"]["items"]["properties"]["name"]["description"],
            "item name"
        );
    }

    #[test]
    fn test_required_tracking() {
        let value = TypedSchema::object()
            .field("name", TypedSchema::string())
            .optional_field("done", TypedSchema::boolean())
            .to_value();
        assert_eq!(value["required"], json!(["name"]));
    }

    #[test]
    fn test_built_descriptor_validates() {
        let descriptor = TypedSchema::object()
            .field("name", TypedSchema::string())
            .build()
            .unwrap();
        assert!(descriptor.validate(&json!({ "name": "ok" })).is_valid());
        assert!(!descriptor.validate(&json!({})).is_valid());
    }

    #[test]
    fn test_enumeration_and_union() {
        let value = TypedSchema::one_of([
            TypedSchema::enumeration([json!("a"), json!("b")]),
            TypedSchema::integer(),
        ])
        .to_value();
        assert_eq!(value["oneOf"][0]["enum"], json!(["a", "b"]));
        assert_eq!(value["oneOf"][1]["type"], "integer");
    }
}
