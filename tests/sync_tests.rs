use http::Method;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use restframe::config::Config;
use restframe::discovery::{DiscoveredRoute, RouteFileKind};
use restframe::engine::{EngineResponse, Environment, ValidationEngine};
use restframe::registry::RouteRegistry;
use restframe::route::{Input, Operation, Output, Route, RpcOperation, RpcRoute};
use restframe::schema::dsl::TypedSchema;
use restframe::schema::SchemaRef;
use restframe::sync::{InProcessProbe, SpecSync, SyncOutcome};
use restframe::telemetry::WarnLedger;

fn object_schema(field: &str) -> SchemaRef {
    Arc::new(
        TypedSchema::object()
            .field(field, TypedSchema::string())
            .build()
            .unwrap(),
    )
}

fn todos_route() -> Route {
    Route::builder()
        .operation(
            Operation::post()
                .operation_id("createTodo")
                .input(Input::json(object_schema("name")))
                .output(Output::json(201, object_schema("message")))
                .handler(|_| Ok(EngineResponse::json(201, json!({ "message": "ok" })))),
        )
        .operation(
            Operation::get()
                .operation_id("listTodos")
                .output(Output::json(200, object_schema("items")))
                .handler(|_| Ok(EngineResponse::json(200, json!({ "items": "[]" })))),
        )
        .build()
}

fn registry() -> Arc<RouteRegistry> {
    Arc::new(
        RouteRegistry::new()
            .register("/api/todos", todos_route())
            .register_rpc(
                "/api/rpc",
                RpcRoute::new().operation(
                    "pingTodo",
                    RpcOperation::builder()
                        .output(Output::json(200, object_schema("pong")))
                        .handler(|_| Ok(EngineResponse::json(200, json!({ "pong": "yes" })))),
                ),
            ),
    )
}

fn discovered() -> Vec<DiscoveredRoute> {
    vec![
        DiscoveredRoute {
            file: "app/api/todos/route.rs".into(),
            url_path: "/api/todos".to_string(),
            kind: RouteFileKind::Route,
        },
        DiscoveredRoute {
            file: "app/api/rpc/[operationId]/route.rs".into(),
            url_path: "/api/rpc/{operationId}".to_string(),
            kind: RouteFileKind::RpcDispatcher {
                base: "/api/rpc".to_string(),
            },
        },
    ]
}

fn spec_sync(config: Config) -> SpecSync {
    let ledger = Arc::new(WarnLedger::new());
    let engine = Arc::new(ValidationEngine::new(Environment::Development, ledger));
    let probe = Arc::new(InProcessProbe::new(engine, registry()));
    SpecSync::new(config, probe, Duration::from_secs(5))
}

#[test]
fn test_probe_and_assemble_full_document() {
    let sync = spec_sync(Config::default());
    let report = sync.collect(&discovered());
    assert!(report.failed.is_empty());
    let document = sync.assemble(&report.fragment);

    assert_eq!(document["openapi"], "3.1.0");
    let todos = &document["paths"]["/api/todos"];
    assert_eq!(todos["post"]["operationId"], "createTodo");
    assert_eq!(todos["get"]["operationId"], "listTodos");
    assert_eq!(
        todos["post"]["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/CreateTodoRequestBody"
    );

    let schemas = &document["components"]["schemas"];
    assert!(schemas["CreateTodoRequestBody"].is_object());
    assert!(schemas["CreateTodo201ResponseBody"].is_object());
    assert!(schemas["ListTodos200ResponseBody"].is_object());
    // Declared responses always gain the shared default error schema.
    assert!(schemas["UnexpectedError"].is_object());

    // The RPC dispatcher contributes synthetic per-operation paths.
    assert!(document["paths"]["/api/rpc/pingTodo"]["post"].is_object());
}

#[test]
fn test_sync_writes_once_then_reports_up_to_date() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("public/openapi.json");
    let sync = spec_sync(Config::default());

    assert_eq!(
        sync.sync_to_file(&discovered(), &file).unwrap(),
        SyncOutcome::Written
    );
    let first = std::fs::read_to_string(&file).unwrap();
    let parsed: Value = serde_json::from_str(&first).unwrap();
    assert_eq!(parsed["openapi"], "3.1.0");

    assert_eq!(
        sync.sync_to_file(&discovered(), &file).unwrap(),
        SyncOutcome::UpToDate
    );
    assert_eq!(std::fs::read_to_string(&file).unwrap(), first);
}

#[test]
fn test_formatting_only_difference_does_not_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("openapi.json");
    let sync = spec_sync(Config::default());
    sync.sync_to_file(&discovered(), &file).unwrap();

    // Re-serialize compactly; the structural comparison must still match.
    let parsed: Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    std::fs::write(&file, serde_json::to_string(&parsed).unwrap()).unwrap();
    assert_eq!(
        sync.sync_to_file(&discovered(), &file).unwrap(),
        SyncOutcome::UpToDate
    );
}

#[test]
fn test_validate_detects_staleness_after_route_change() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("openapi.json");
    let sync = spec_sync(Config::default());
    sync.sync_to_file(&discovered(), &file).unwrap();
    assert_eq!(
        sync.validate_file(&discovered(), &file).unwrap(),
        SyncOutcome::UpToDate
    );

    // A config change that reaches the document makes the file stale.
    let mut config = Config::default();
    config.docs.title = "Renamed API".to_string();
    let changed = spec_sync(config);
    assert_eq!(
        changed.validate_file(&discovered(), &file).unwrap(),
        SyncOutcome::Stale
    );
    // Validation never writes.
    let on_disk: Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_ne!(on_disk["info"]["title"], "Renamed API");
}

#[test]
fn test_unregistered_route_fails_in_isolation() {
    let sync = spec_sync(Config::default());
    let mut routes = discovered();
    routes.push(DiscoveredRoute {
        file: "app/api/ghost/route.rs".into(),
        url_path: "/api/ghost".to_string(),
        kind: RouteFileKind::Route,
    });
    let report = sync.collect(&routes);
    assert_eq!(report.failed, vec!["/api/ghost"]);
    assert!(report.fragment.paths.contains_key("/api/todos"));
}

#[test]
fn test_spec_overrides_win_over_generated_content() {
    let config_value: Config = {
        let mut config = Config::default();
        config.spec_overrides = Some(json!({
            "info": { "version": "3.2.1" },
            "servers": [{ "url": "https://api.example.com" }]
        }));
        config
    };
    let sync = spec_sync(config_value);
    let report = sync.collect(&discovered());
    let document = sync.assemble(&report.fragment);
    assert_eq!(document["info"]["version"], "3.2.1");
    assert_eq!(document["servers"][0]["url"], "https://api.example.com");
    // Generated content outside the overridden keys survives.
    assert!(document["paths"]["/api/todos"].is_object());
}
