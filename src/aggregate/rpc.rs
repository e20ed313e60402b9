use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::{build_responses, capitalize, deep_merge, schema_ref, OasFragment};
use crate::route::{RpcRoute, RPC_OPERATION_HEADER};
use crate::schema::{ConversionContext, SchemaDescriptor, SchemaRole};
use crate::telemetry::WarnLedger;

/// PascalCase identifier for the dispatcher base route: `/api/rpc` → `ApiRpc`.
fn base_identifier(base_pattern: &str) -> String {
    base_pattern
        .split('/')
        .map(|segment| {
            capitalize(
                &segment
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>(),
            )
        })
        .collect()
}

/// Aggregate an RPC dispatcher route.
///
/// One synthetic path is generated per operation at `{base}/{operationId}`,
/// and the request/response schemas are additionally grouped into
/// discriminated unions keyed by the operation-selector header, so a client
/// generator sees the dispatch contract, not just the flattened paths.
pub fn aggregate_rpc_route(
    base_pattern: &str,
    route: &RpcRoute,
    ledger: &WarnLedger,
) -> anyhow::Result<OasFragment> {
    let base = base_pattern.trim_end_matches('/');
    let mut paths = BTreeMap::new();
    let mut schemas = BTreeMap::new();

    let mut request_members: Vec<(String, String)> = Vec::new();
    let mut response_members: Vec<String> = Vec::new();

    for (name, op) in route.operations() {
        let mut operation = json!({ "operationId": name });

        if let Some(body) = op.input.as_ref().and_then(|input| input.body.as_ref()) {
            let ctx = ConversionContext {
                operation_id: name,
                role: SchemaRole::RequestBody,
                ledger,
            };
            let schema_name = format!("{}RequestBody", capitalize(name));
            schemas.insert(schema_name.clone(), body.to_json_schema(&ctx));
            let content_type = op
                .input
                .as_ref()
                .and_then(|input| input.content_type.as_deref())
                .unwrap_or("application/json");
            operation["requestBody"] = json!({
                "required": true,
                "content": { content_type: { "schema": schema_ref(&schema_name) } }
            });
            request_members.push((name.clone(), schema_name));
        }

        let responses = build_responses(name, &op.outputs, &mut schemas, ledger);
        if let Some(first) = op.outputs.first() {
            let first_name = first.name.clone().unwrap_or_else(|| {
                format!("{}{}ResponseBody", capitalize(name), first.status)
            });
            response_members.push(first_name);
        }
        operation["responses"] = Value::Object(responses);

        if let Some(overrides) = &op.operation_overrides {
            deep_merge(&mut operation, overrides);
        }

        let mut path_item = Map::new();
        path_item.insert("post".to_string(), operation);
        paths.insert(format!("{base}/{name}"), Value::Object(path_item));
    }

    let base_id = base_identifier(base);
    if !request_members.is_empty() {
        let mapping: Map<String, Value> = request_members
            .iter()
            .map(|(name, schema_name)| {
                (
                    name.clone(),
                    Value::String(format!("#/components/schemas/{schema_name}")),
                )
            })
            .collect();
        let one_of: Vec<Value> = request_members
            .iter()
            .map(|(_, schema_name)| schema_ref(schema_name))
            .collect();
        schemas.insert(
            format!("{base_id}Request"),
            json!({
                "oneOf": one_of,
                "discriminator": {
                    "propertyName": RPC_OPERATION_HEADER,
                    "mapping": mapping
                }
            }),
        );
    }
    if !response_members.is_empty() {
        let one_of: Vec<Value> = response_members.iter().map(|n| schema_ref(n)).collect();
        schemas.insert(format!("{base_id}Response"), json!({ "oneOf": one_of }));
    }

    Ok(OasFragment { paths, schemas })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Input, Output, RpcOperation};
    use crate::schema::dsl::TypedSchema;
    use crate::schema::SchemaRef;
    use std::sync::Arc;

    fn schema(name: &str) -> SchemaRef {
        Arc::new(
            TypedSchema::object()
                .field(name, TypedSchema::string())
                .build()
                .unwrap(),
        )
    }

    fn sample_route() -> RpcRoute {
        RpcRoute::new()
            .operation(
                "createTodo",
                RpcOperation::builder()
                    .input(Input::json(schema("name")))
                    .output(Output::json(200, schema("message")))
                    .build(),
            )
            .operation(
                "listTodos",
                RpcOperation::builder()
                    .output(Output::json(200, schema("items")))
                    .build(),
            )
    }

    #[test]
    fn test_synthetic_path_per_operation() {
        let ledger = WarnLedger::new();
        let fragment = aggregate_rpc_route("/api/rpc", &sample_route(), &ledger).unwrap();
        assert!(fragment.paths.contains_key("/api/rpc/createTodo"));
        assert!(fragment.paths.contains_key("/api/rpc/listTodos"));
        assert!(fragment.paths["/api/rpc/createTodo"]["post"].is_object());
    }

    #[test]
    fn test_discriminated_request_grouping() {
        let ledger = WarnLedger::new();
        let fragment = aggregate_rpc_route("/api/rpc", &sample_route(), &ledger).unwrap();
        let union = &fragment.schemas["ApiRpcRequest"];
        assert_eq!(
            union["discriminator"]["propertyName"],
            RPC_OPERATION_HEADER
        );
        assert_eq!(
            union["discriminator"]["mapping"]["createTodo"],
            "#/components/schemas/CreateTodoRequestBody"
        );
        assert_eq!(union["oneOf"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_response_grouping_references_named_schemas() {
        let ledger = WarnLedger::new();
        let fragment = aggregate_rpc_route("/api/rpc", &sample_route(), &ledger).unwrap();
        let union = &fragment.schemas["ApiRpcResponse"];
        let refs: Vec<&str> = union["oneOf"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["$ref"].as_str().unwrap())
            .collect();
        assert!(refs.contains(&"#/components/schemas/CreateTodo200ResponseBody"));
        assert!(refs.contains(&"#/components/schemas/ListTodos200ResponseBody"));
    }
}
