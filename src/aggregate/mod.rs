//! # Path/Schema Aggregator
//!
//! Walks the operations declared on one route pattern and produces the
//! OpenAPI `PathItem` plus a table of named, de-duplicated JSON Schemas for
//! its request and response bodies. This is the unit of data that flows from
//! per-route introspection up to the merged document.
//!
//! Naming is deterministic: `{OperationId}RequestBody` for inputs and
//! `{OperationId}{Status}ResponseBody{N}` for outputs, where `N`
//! disambiguates repeated status codes (empty for the first occurrence).
//! Collisions are resolved by the suffix, never by silent overwrite.
//!
//! User-supplied OpenAPI fragments (`operation_overrides`, `path_overrides`)
//! are deep-merged on top of the generated objects: overrides win field by
//! field, not wholesale.

mod rpc;

pub use rpc::aggregate_rpc_route;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::route::{Operation, Output, Route};
use crate::schema::{ConversionContext, SchemaDescriptor, SchemaRole};
use crate::telemetry::WarnLedger;

/// Name of the shared error schema referenced by every default 500 response.
pub const UNEXPECTED_ERROR_SCHEMA: &str = "UnexpectedError";

/// Aggregation unit: OpenAPI paths and named schemas for one or more routes.
///
/// `BTreeMap` keeps keys sorted so serialized output is diff-stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OasFragment {
    pub paths: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Value>,
}

impl OasFragment {
    /// Merge `other` into `self` by key. Path keys are unique to one route by
    /// construction, and schema names are collision-free within one route; a
    /// cross-route collision with differing content indicates duplicated
    /// operation ids and is logged, with the later entry winning.
    pub fn merge(&mut self, other: OasFragment) {
        for (key, value) in other.paths {
            if let Some(existing) = self.paths.get(&key) {
                if *existing != value {
                    tracing::error!(
                        path = %key,
                        "conflicting PathItem for the same route pattern; keeping the later one"
                    );
                }
            }
            self.paths.insert(key, value);
        }
        for (name, schema) in other.schemas {
            if let Some(existing) = self.schemas.get(&name) {
                if *existing != schema {
                    tracing::error!(
                        schema = %name,
                        "conflicting definitions for the same schema name; keeping the later one"
                    );
                }
            }
            self.schemas.insert(name, schema);
        }
    }
}

/// Uppercase the first character: `get_todo` naming inputs become `Get_todo`.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Derive a camelCase operation id from the method and route pattern, used
/// when the author did not set one: `POST /api/todos/{id}` → `postApiTodosId`.
pub fn derive_operation_id(method: &http::Method, pattern: &str) -> String {
    let mut id = method.as_str().to_ascii_lowercase();
    for segment in pattern.split('/') {
        let cleaned: String = segment
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if !cleaned.is_empty() {
            id.push_str(&capitalize(&cleaned));
        }
    }
    id
}

/// Path parameter names from `{name}` segments of a route pattern.
pub fn path_param_names(pattern: &str) -> Vec<String> {
    pattern
        .split('/')
        .filter_map(|segment| {
            segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
        })
        .map(str::to_string)
        .collect()
}

/// Deep-merge `overlay` onto `base`: objects merge recursively, everything
/// else is replaced by the overlay value.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn unexpected_error_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "message": { "type": "string" } },
        "required": ["message"],
        "additionalProperties": false
    })
}

/// Build the `responses` object for a set of outputs, registering each body
/// schema under a collision-free name.
pub(crate) fn build_responses(
    operation_id: &str,
    outputs: &[Output],
    schemas: &mut BTreeMap<String, Value>,
    ledger: &WarnLedger,
) -> Map<String, Value> {
    let mut responses = Map::new();
    let mut status_counts: BTreeMap<u16, usize> = BTreeMap::new();

    for output in outputs {
        let occurrence = status_counts.entry(output.status).or_insert(0);
        *occurrence += 1;
        let suffix = if *occurrence == 1 {
            String::new()
        } else {
            occurrence.to_string()
        };
        let schema_name = output.name.clone().unwrap_or_else(|| {
            format!(
                "{}{}ResponseBody{suffix}",
                capitalize(operation_id),
                output.status
            )
        });
        let ctx = ConversionContext {
            operation_id,
            role: SchemaRole::ResponseBody(output.status),
            ledger,
        };
        schemas.insert(schema_name.clone(), output.body.to_json_schema(&ctx));

        let content_entry = json!({ "schema": schema_ref(&schema_name) });
        let status_key = output.status.to_string();
        match responses.get_mut(&status_key) {
            Some(existing) => {
                // Same status declared twice: merge by content type.
                if let Some(content) = existing
                    .get_mut("content")
                    .and_then(Value::as_object_mut)
                {
                    content.insert(output.content_type.clone(), content_entry);
                }
            }
            None => {
                responses.insert(
                    status_key,
                    json!({
                        "description": format!("Response status {}", output.status),
                        "content": { &output.content_type: content_entry }
                    }),
                );
            }
        }
    }

    if !responses.contains_key("500") {
        schemas.insert(
            UNEXPECTED_ERROR_SCHEMA.to_string(),
            unexpected_error_schema(),
        );
        responses.insert(
            "500".to_string(),
            json!({
                "description": "Unexpected error",
                "content": {
                    "application/json": { "schema": schema_ref(UNEXPECTED_ERROR_SCHEMA) }
                }
            }),
        );
    }

    responses
}

/// Build one OperationObject and register its schemas. Fails when a declared
/// query schema is not object-shaped, which is a route declaration error.
fn build_operation(
    pattern: &str,
    operation_id: &str,
    op: &Operation,
    schemas: &mut BTreeMap<String, Value>,
    ledger: &WarnLedger,
) -> anyhow::Result<Value> {
    let mut operation = json!({ "operationId": operation_id });
    let path_params = path_param_names(pattern);

    if let Some(input) = &op.input {
        if let Some(body) = &input.body {
            let ctx = ConversionContext {
                operation_id,
                role: SchemaRole::RequestBody,
                ledger,
            };
            let name = format!("{}RequestBody", capitalize(operation_id));
            schemas.insert(name.clone(), body.to_json_schema(&ctx));
            let content_type = input.content_type.as_deref().unwrap_or("application/json");
            operation["requestBody"] = json!({
                "required": true,
                "content": { content_type: { "schema": schema_ref(&name) } }
            });
        }
    }

    let mut parameters: Vec<Value> = path_params
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            })
        })
        .collect();

    if let Some(query) = op.input.as_ref().and_then(|input| input.query.as_ref()) {
        let keys = query.extract_keys().with_context(|| {
            format!("query schema for operation {operation_id} is not object-shaped")
        })?;
        let ctx = ConversionContext {
            operation_id,
            role: SchemaRole::Query,
            ledger,
        };
        let query_schema = query.to_json_schema(&ctx);
        let required: Vec<String> = query_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let props = query_schema.get("properties").and_then(Value::as_object);
        for name in keys {
            // The same key cannot be documented twice: path wins.
            if path_params.iter().any(|p| *p == name) {
                continue;
            }
            let prop = props
                .and_then(|p| p.get(&name))
                .cloned()
                .unwrap_or_else(|| json!({}));
            parameters.push(json!({
                "name": name,
                "in": "query",
                "required": required.iter().any(|r| *r == name),
                "schema": prop
            }));
        }
    }

    if !parameters.is_empty() {
        operation["parameters"] = Value::Array(parameters);
    }

    operation["responses"] = Value::Object(build_responses(
        operation_id,
        &op.outputs,
        schemas,
        ledger,
    ));

    if let Some(overrides) = &op.operation_overrides {
        deep_merge(&mut operation, overrides);
    }

    Ok(operation)
}

/// Aggregate one method-dispatched route into an [`OasFragment`].
pub fn aggregate_route(
    pattern: &str,
    route: &Route,
    ledger: &WarnLedger,
) -> anyhow::Result<OasFragment> {
    let mut schemas = BTreeMap::new();
    let mut path_item = Value::Object(Map::new());

    for (method, op) in route.operations() {
        let operation_id = op
            .operation_id
            .clone()
            .unwrap_or_else(|| derive_operation_id(method, pattern));
        let operation = build_operation(pattern, &operation_id, op, &mut schemas, ledger)?;
        path_item[method.as_str().to_ascii_lowercase()] = operation;
    }

    if let Some(overrides) = &route.path_overrides {
        deep_merge(&mut path_item, overrides);
    }

    let mut paths = BTreeMap::new();
    paths.insert(pattern.to_string(), path_item);
    Ok(OasFragment { paths, schemas })
}
