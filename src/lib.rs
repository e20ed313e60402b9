//! # restframe
//!
//! **restframe** is a schema validation and OpenAPI aggregation layer for
//! file-system-routed HTTP services. Routes declare their input and output
//! schemas once; the same declarations drive request validation at runtime
//! and produce the [OpenAPI 3.1.0](https://spec.openapis.org/oas/v3.1.0)
//! document, so the served contract can never drift from the enforced one.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`schema`]** - Schema descriptors: the adapter trait, the JSON Schema
//!   adapter, and a small typed DSL for building schemas in code
//! - **[`route`]** - Route and operation declarations (methods, inputs,
//!   outputs, middleware, handlers), plus the RPC dispatcher variant
//! - **[`engine`]** - The per-request validation state machine: method check,
//!   introspection short-circuit, middleware chain, content-type and schema
//!   validation, handler dispatch
//! - **[`aggregate`]** - Per-route OpenAPI fragment generation with
//!   deterministic schema naming
//! - **[`discovery`]** - Route file enumeration, classification, and
//!   allow/deny glob filtering
//! - **[`sync`]** - The spec synchronizer: concurrent route probing, document
//!   assembly, and change-detecting persistence
//! - **[`docs`]** - JSON/YAML document rendering and the Redoc / Swagger UI
//!   docs page
//! - **[`registry`]** - The pattern-keyed route table shared by the engine
//!   and the synchronizer
//! - **[`config`]** - Partial-over-defaults configuration
//! - **[`cli`]** - Embeddable `generate` / `validate` commands
//!
//! ## Request Flow
//!
//! ```text
//! request
//!   └─ method supported? ──────────────── 405 + Allow
//!   └─ introspection marker? ──────────── 200 fragment (403 in production)
//!   └─ operation registered? ──────────── 405 + Allow
//!   └─ middleware chain ───────────────── terminal response or merged options
//!   └─ content type matches? ──────────── 415
//!   └─ body / query / path validation ─── 400 with structured issues
//!   └─ handler ────────────────────────── its response (500 on error)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use restframe::engine::{Environment, EngineRequest, EngineResponse, ValidationEngine};
//! use restframe::route::{Input, Operation, Output, Route};
//! use restframe::schema::dsl::TypedSchema;
//! use restframe::telemetry::WarnLedger;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let body = Arc::new(
//!     TypedSchema::object()
//!         .field("name", TypedSchema::string())
//!         .build()?,
//! );
//! let message = Arc::new(
//!     TypedSchema::object()
//!         .field("message", TypedSchema::string())
//!         .build()?,
//! );
//!
//! let route = Route::builder()
//!     .operation(
//!         Operation::post()
//!             .input(Input::json(body))
//!             .output(Output::json(201, message))
//!             .handler(|args| {
//!                 let name = args.body.and_then(|b| {
//!                     b.get("name").and_then(|n| n.as_str().map(str::to_string))
//!                 });
//!                 Ok(EngineResponse::json(
//!                     201,
//!                     serde_json::json!({ "message": name }),
//!                 ))
//!             }),
//!     )
//!     .build();
//!
//! let engine = ValidationEngine::new(Environment::Development, Arc::new(WarnLedger::new()));
//! let req = EngineRequest::new(http::Method::POST, "/api/todos")
//!     .json_body(&serde_json::json!({ "name": "Buy milk" }));
//! let res = engine.handle("/api/todos", &route, &req);
//! assert_eq!(res.status, 201);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod docs;
pub mod engine;
pub mod ids;
pub mod registry;
pub mod route;
pub mod schema;
pub mod sync;
pub mod telemetry;

pub use aggregate::OasFragment;
pub use config::Config;
pub use engine::{EngineRequest, EngineResponse, Environment, ValidationEngine};
pub use ids::RequestId;
pub use registry::{RouteEntry, RouteRegistry};
pub use route::{Operation, Route, RpcOperation, RpcRoute};
pub use schema::{JsonSchema, SchemaDescriptor, SchemaRef};
pub use sync::{InProcessProbe, SpecSync, SyncOutcome};
pub use telemetry::WarnLedger;
