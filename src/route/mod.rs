//! # Route Descriptor Model
//!
//! The shared data model between the request validation engine and the
//! OpenAPI aggregator: a [`Route`] maps HTTP methods to [`Operation`]s, each
//! carrying optional typed input/output descriptors, ordered middleware, and
//! a handler. [`RpcRoute`] is the specialization where the dispatch key is an
//! operation name instead of the HTTP method.
//!
//! Builders are plain accumulation: nothing is enforced at construction
//! beyond field presence, and a handler-less operation is legal (it documents
//! an endpoint without serving it; dispatching one is an explicit error at
//! request time, never a silent success).

mod operation;
mod route;

pub use operation::{
    Handler, HandlerArgs, Input, Middleware, MiddlewareOutcome, Operation, OperationBuilder,
    Output,
};
pub use route::{Route, RouteBuilder, RpcOperation, RpcOperationBuilder, RpcRoute};

/// Header carrying the operation name for RPC-style routes.
pub const RPC_OPERATION_HEADER: &str = "x-rpc-operation";

/// Methods a route may declare. Anything outside this set is answered with
/// 405 regardless of what the route declares.
pub const SUPPORTED_METHODS: [http::Method; 8] = [
    http::Method::GET,
    http::Method::PUT,
    http::Method::POST,
    http::Method::DELETE,
    http::Method::OPTIONS,
    http::Method::HEAD,
    http::Method::PATCH,
    http::Method::TRACE,
];
