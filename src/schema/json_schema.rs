use anyhow::Context;
use jsonschema::Validator;
use serde_json::Value;

use super::{ConversionContext, FieldType, SchemaDescriptor, SchemaIssue, Validated};

/// Adapter over a raw JSON Schema document.
///
/// The validator is compiled once at construction; a schema that does not
/// compile is a programmer error and surfaces there, never at request time.
pub struct JsonSchema {
    raw: Value,
    validator: Validator,
}

impl std::fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchema").field("raw", &self.raw).finish()
    }
}

impl JsonSchema {
    /// Compile a JSON Schema document into a descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a structurally valid schema.
    pub fn new(raw: Value) -> anyhow::Result<Self> {
        let validator = jsonschema::validator_for(&raw)
            .with_context(|| format!("invalid JSON Schema document: {raw}"))?;
        Ok(Self { raw, validator })
    }

    /// The underlying schema document.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl SchemaDescriptor for JsonSchema {
    fn validate(&self, value: &Value) -> Validated {
        let issues: Vec<SchemaIssue> = self
            .validator
            .iter_errors(value)
            .map(|err| SchemaIssue {
                path: err.instance_path().to_string(),
                message: err.to_string(),
            })
            .collect();
        if issues.is_empty() {
            Validated::Valid(value.clone())
        } else {
            Validated::Invalid(issues)
        }
    }

    fn to_json_schema(&self, ctx: &ConversionContext<'_>) -> Value {
        match &self.raw {
            Value::Object(_) => self.raw.clone(),
            // `true` is the JSON Schema that accepts everything.
            Value::Bool(true) => Value::Object(serde_json::Map::new()),
            other => {
                ctx.ledger.record_degraded(
                    ctx.operation_id,
                    &ctx.role.to_string(),
                    &format!("schema document is not an object: {other}"),
                );
                Value::Object(serde_json::Map::new())
            }
        }
    }

    fn extract_keys(&self) -> anyhow::Result<Vec<String>> {
        let obj = self
            .raw
            .as_object()
            .filter(|o| {
                o.get("type").and_then(Value::as_str) == Some("object")
                    || o.contains_key("properties")
            })
            .ok_or_else(|| anyhow::anyhow!("expected an object-shaped schema, got: {}", self.raw))?;
        Ok(obj
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn field_type(&self, key: &str) -> Option<FieldType> {
        let ty = self
            .raw
            .get("properties")?
            .get(key)?
            .get("type")?
            .as_str()?;
        match ty {
            "string" => Some(FieldType::String),
            "integer" => Some(FieldType::Integer),
            "number" => Some(FieldType::Number),
            "boolean" => Some(FieldType::Boolean),
            "array" => Some(FieldType::Array),
            "object" => Some(FieldType::Object),
            _ => None,
        }
    }
}
