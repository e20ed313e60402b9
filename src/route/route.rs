use http::Method;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::operation::{Handler, HandlerArgs, Input, Middleware, Operation, Output};
use crate::engine::EngineResponse;

/// A routable endpoint: one operation per HTTP method, plus route-level
/// middleware and OpenAPI path overrides.
///
/// The method set is fixed at construction; adding methods means building a
/// new route.
#[derive(Clone)]
pub struct Route {
    operations: HashMap<Method, Operation>,
    pub middleware: Vec<Arc<dyn Middleware>>,
    /// Raw OpenAPI PathItem fragment deep-merged over the generated one.
    pub path_overrides: Option<Value>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("methods", &self.methods())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

impl Route {
    pub fn builder() -> RouteBuilder {
        RouteBuilder::default()
    }

    pub fn operation(&self, method: &Method) -> Option<&Operation> {
        self.operations.get(method)
    }

    /// Declared methods in a stable order.
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.operations.keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Iterate operations keyed by method, in stable method order.
    pub fn operations(&self) -> impl Iterator<Item = (&Method, &Operation)> {
        let mut entries: Vec<_> = self.operations.iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
        entries.into_iter()
    }

    /// Value for the `Allow` header on 405 responses, e.g. `"GET, POST"`.
    pub fn allow_header(&self) -> String {
        self.methods()
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Accumulating builder for [`Route`].
#[derive(Default)]
pub struct RouteBuilder {
    operations: Vec<Operation>,
    middleware: Vec<Arc<dyn Middleware>>,
    path_overrides: Option<Value>,
}

impl RouteBuilder {
    /// Register an operation under its own method. A later operation with the
    /// same method replaces the earlier one.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Route-level middleware, run before any operation middleware.
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn path_overrides(mut self, fragment: Value) -> Self {
        self.path_overrides = Some(fragment);
        self
    }

    pub fn build(self) -> Route {
        let mut operations = HashMap::new();
        for op in self.operations {
            operations.insert(op.method.clone(), op);
        }
        Route {
            operations,
            middleware: self.middleware,
            path_overrides: self.path_overrides,
        }
    }
}

/// An RPC-style operation: implicitly POST, dispatched by operation name.
#[derive(Clone)]
pub struct RpcOperation {
    pub input: Option<Input>,
    pub outputs: Vec<Output>,
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub handler: Option<Handler>,
    pub operation_overrides: Option<Value>,
}

impl std::fmt::Debug for RpcOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcOperation")
            .field("input", &self.input)
            .field("outputs", &self.outputs)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl RpcOperation {
    pub fn builder() -> RpcOperationBuilder {
        RpcOperationBuilder::default()
    }
}

/// Accumulating builder for [`RpcOperation`].
#[derive(Default)]
pub struct RpcOperationBuilder {
    input: Option<Input>,
    outputs: Vec<Output>,
    middleware: Vec<Arc<dyn Middleware>>,
    handler: Option<Handler>,
    operation_overrides: Option<Value>,
}

impl RpcOperationBuilder {
    pub fn input(mut self, input: Input) -> Self {
        self.input = Some(input);
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn overrides(mut self, fragment: Value) -> Self {
        self.operation_overrides = Some(fragment);
        self
    }

    pub fn handler<F>(mut self, handler: F) -> RpcOperation
    where
        F: Fn(HandlerArgs) -> anyhow::Result<EngineResponse> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self.build()
    }

    pub fn build(self) -> RpcOperation {
        RpcOperation {
            input: self.input,
            outputs: self.outputs,
            middleware: self.middleware,
            handler: self.handler,
            operation_overrides: self.operation_overrides,
        }
    }
}

/// A set of named RPC operations behind one dispatcher endpoint.
#[derive(Clone, Default)]
pub struct RpcRoute {
    operations: BTreeMap<String, RpcOperation>,
    pub middleware: Vec<Arc<dyn Middleware>>,
}

impl std::fmt::Debug for RpcRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcRoute")
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

impl RpcRoute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under its name. Names must be unique; a
    /// duplicate replaces the earlier registration.
    pub fn operation(mut self, name: impl Into<String>, operation: RpcOperation) -> Self {
        self.operations.insert(name.into(), operation);
        self
    }

    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RpcOperation> {
        self.operations.get(name)
    }

    /// Operation names and definitions in name order.
    pub fn operations(&self) -> impl Iterator<Item = (&String, &RpcOperation)> {
        self.operations.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
