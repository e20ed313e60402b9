//! # Request Validation Engine
//!
//! The per-request state machine every wrapped route runs: method dispatch,
//! middleware chaining, content-type/body/query/param validation, and handler
//! invocation, terminal at the first produced response. Declared outputs are
//! documentation-only and never enforced here; whatever the handler returns
//! is passed through verbatim to keep the hot path cheap.
//!
//! The engine also owns the introspection short-circuit: a request carrying
//! the reserved [`INTROSPECTION_USER_AGENT`] outside production is answered
//! with the route's aggregated OpenAPI fragment instead of business logic.
//! The dual purpose is explicit in the API: [`ValidationEngine::handle`]
//! serves traffic, [`ValidationEngine::describe`] produces the fragment, and
//! `handle` picks between them from the marker alone.

mod core;
mod request;
mod response;

pub use self::core::ValidationEngine;
pub use request::EngineRequest;
pub use response::{EngineResponse, HeaderVec};

/// Reserved `User-Agent` value the spec synchronizer sends when probing a
/// route for its OpenAPI fragment. Ordinary clients must never trigger it:
/// in production it is answered with 403.
pub const INTROSPECTION_USER_AGENT: &str = "restframe-spec-probe";

/// Generic message returned to clients for unexpected handler failures.
/// Internal error text never leaks to production clients.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unknown error occurred, trying again might help.";

/// Deployment environment, controlling introspection reachability and how
/// much error detail is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}
