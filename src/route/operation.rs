use http::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::engine::{EngineRequest, EngineResponse};
use crate::ids::RequestId;
use crate::schema::SchemaRef;

/// Input descriptors for one operation. Absence of a part means no
/// validation is performed for that part.
#[derive(Clone, Default)]
pub struct Input {
    /// Expected request content type; mismatches yield 415.
    pub content_type: Option<String>,
    /// Schema for the JSON request body.
    pub body: Option<SchemaRef>,
    /// Object-shaped schema for query parameters.
    pub query: Option<SchemaRef>,
    /// Object-shaped schema for path parameters.
    pub params: Option<SchemaRef>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a JSON body input.
    pub fn json(body: SchemaRef) -> Self {
        Self {
            content_type: Some("application/json".to_string()),
            body: Some(body),
            query: None,
            params: None,
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn body(mut self, schema: SchemaRef) -> Self {
        self.body = Some(schema);
        self
    }

    pub fn query(mut self, schema: SchemaRef) -> Self {
        self.query = Some(schema);
        self
    }

    pub fn params(mut self, schema: SchemaRef) -> Self {
        self.params = Some(schema);
        self
    }
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input")
            .field("content_type", &self.content_type)
            .field("body", &self.body.is_some())
            .field("query", &self.query.is_some())
            .field("params", &self.params.is_some())
            .finish()
    }
}

/// One declared response shape. Documentation-only: never enforced against
/// actual handler output at runtime.
#[derive(Clone)]
pub struct Output {
    pub status: u16,
    pub content_type: String,
    pub body: SchemaRef,
    /// Optional explicit schema name, overriding the derived one.
    pub name: Option<String>,
}

impl Output {
    pub fn new(status: u16, content_type: impl Into<String>, body: SchemaRef) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
            name: None,
        }
    }

    /// Shorthand for a JSON response.
    pub fn json(status: u16, body: SchemaRef) -> Self {
        Self::new(status, "application/json", body)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("name", &self.name)
            .finish()
    }
}

/// What a middleware decided about the request.
pub enum MiddlewareOutcome {
    /// Continue the chain unchanged.
    Pass,
    /// Shallow-merge these entries into the accumulated options, then continue.
    Merge(Map<String, Value>),
    /// Terminal response; remaining middleware and the handler never run.
    Respond(EngineResponse),
}

/// Per-operation (or per-route) middleware.
///
/// Middleware always runs before schema validation, so it can perform auth or
/// rewriting before validation cost is spent. An error return terminates the
/// request with a 500 and the handler is never invoked.
pub trait Middleware: Send + Sync {
    fn call(
        &self,
        req: &EngineRequest,
        options: &Map<String, Value>,
    ) -> anyhow::Result<MiddlewareOutcome>;
}

impl<F> Middleware for F
where
    F: Fn(&EngineRequest, &Map<String, Value>) -> anyhow::Result<MiddlewareOutcome> + Send + Sync,
{
    fn call(
        &self,
        req: &EngineRequest,
        options: &Map<String, Value>,
    ) -> anyhow::Result<MiddlewareOutcome> {
        self(req, options)
    }
}

/// Validated input handed to a handler.
#[derive(Debug, Clone)]
pub struct HandlerArgs {
    pub request_id: RequestId,
    /// Parsed and validated request body, when a body schema was declared.
    pub body: Option<Value>,
    /// Coerced and validated query parameters.
    pub query: Option<Value>,
    /// Coerced and validated path parameters.
    pub params: Option<Value>,
    /// Options accumulated by the middleware chain.
    pub options: Map<String, Value>,
}

/// Handler function invoked after validation. Errors map to a generic 500.
pub type Handler = Arc<dyn Fn(HandlerArgs) -> anyhow::Result<EngineResponse> + Send + Sync>;

/// One HTTP method's worth of behavior on a route.
#[derive(Clone)]
pub struct Operation {
    pub method: Method,
    /// Stable identifier used for schema naming; derived from the route
    /// pattern when not set explicitly.
    pub operation_id: Option<String>,
    pub input: Option<Input>,
    pub outputs: Vec<Output>,
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub handler: Option<Handler>,
    /// Raw OpenAPI OperationObject fragment deep-merged over the generated one.
    pub operation_overrides: Option<Value>,
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("method", &self.method)
            .field("operation_id", &self.operation_id)
            .field("input", &self.input)
            .field("outputs", &self.outputs)
            .field("middleware", &self.middleware.len())
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl Operation {
    pub fn builder(method: Method) -> OperationBuilder {
        OperationBuilder::new(method)
    }

    pub fn get() -> OperationBuilder {
        OperationBuilder::new(Method::GET)
    }

    pub fn post() -> OperationBuilder {
        OperationBuilder::new(Method::POST)
    }

    pub fn put() -> OperationBuilder {
        OperationBuilder::new(Method::PUT)
    }

    pub fn delete() -> OperationBuilder {
        OperationBuilder::new(Method::DELETE)
    }

    pub fn patch() -> OperationBuilder {
        OperationBuilder::new(Method::PATCH)
    }
}

/// Accumulating builder for [`Operation`]. All setters are optional and
/// order-insensitive; `build()` is the only terminal call and performs no
/// validation beyond collecting the record.
pub struct OperationBuilder {
    op: Operation,
}

impl OperationBuilder {
    fn new(method: Method) -> Self {
        Self {
            op: Operation {
                method,
                operation_id: None,
                input: None,
                outputs: Vec::new(),
                middleware: Vec::new(),
                handler: None,
                operation_overrides: None,
            },
        }
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.op.operation_id = Some(id.into());
        self
    }

    pub fn input(mut self, input: Input) -> Self {
        self.op.input = Some(input);
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.op.outputs.push(output);
        self
    }

    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.op.middleware.push(middleware);
        self
    }

    pub fn overrides(mut self, fragment: Value) -> Self {
        self.op.operation_overrides = Some(fragment);
        self
    }

    /// Attach the handler and finish.
    pub fn handler<F>(mut self, handler: F) -> Operation
    where
        F: Fn(HandlerArgs) -> anyhow::Result<EngineResponse> + Send + Sync + 'static,
    {
        self.op.handler = Some(Arc::new(handler));
        self.op
    }

    /// Finish without a handler: a documentation-only operation.
    pub fn build(self) -> Operation {
        self.op
    }
}
