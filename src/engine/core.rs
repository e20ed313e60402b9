use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::request::{coerce_param, EngineRequest};
use super::response::EngineResponse;
use super::{Environment, INTROSPECTION_USER_AGENT, UNEXPECTED_ERROR_MESSAGE};
use crate::aggregate::{self, OasFragment};
use crate::route::{
    HandlerArgs, Input, Middleware, MiddlewareOutcome, Route, RpcOperation, RpcRoute,
    RPC_OPERATION_HEADER, SUPPORTED_METHODS,
};
use crate::schema::{SchemaDescriptor, Validated};
use crate::telemetry::WarnLedger;

/// What the middleware chain decided before validation started.
enum ChainResult {
    Continue(Map<String, Value>),
    Terminal(EngineResponse),
}

/// The per-request state machine.
///
/// One engine instance serves many concurrent requests: operations are
/// immutable after construction and all per-request state lives on the stack,
/// so no locking is needed on this path.
pub struct ValidationEngine {
    env: Environment,
    ledger: Arc<WarnLedger>,
}

impl ValidationEngine {
    pub fn new(env: Environment, ledger: Arc<WarnLedger>) -> Self {
        Self { env, ledger }
    }

    pub fn environment(&self) -> Environment {
        self.env
    }

    pub fn ledger(&self) -> &Arc<WarnLedger> {
        &self.ledger
    }

    /// Serve one request against a method-dispatched route.
    pub fn handle(&self, pattern: &str, route: &Route, req: &EngineRequest) -> EngineResponse {
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "handling request"
        );

        if !SUPPORTED_METHODS.contains(&req.method) {
            return EngineResponse::method_not_allowed(&route.allow_header());
        }

        if let Some(res) = self.introspection_short_circuit(req, || self.describe(pattern, route)) {
            return res;
        }

        let Some(op) = route.operation(&req.method) else {
            return EngineResponse::method_not_allowed(&route.allow_header());
        };

        let options = match self.run_middleware(req, &route.middleware, &op.middleware) {
            ChainResult::Continue(options) => options,
            ChainResult::Terminal(res) => return res,
        };

        match self.validate_input(req, op.input.as_ref()) {
            Ok((body, query, params)) => {
                self.dispatch(req, op.handler.as_deref(), body, query, params, options)
            }
            Err(res) => res,
        }
    }

    /// Serve one request against an RPC dispatcher route. The dispatch key is
    /// the operation name from the selector header or the final path segment.
    pub fn handle_rpc(&self, pattern: &str, route: &RpcRoute, req: &EngineRequest) -> EngineResponse {
        if let Some(res) =
            self.introspection_short_circuit(req, || self.describe_rpc(pattern, route))
        {
            return res;
        }

        if req.method != http::Method::POST {
            return EngineResponse::method_not_allowed("POST");
        }

        let name = req
            .get_header(RPC_OPERATION_HEADER)
            .map(str::to_string)
            .or_else(|| req.last_path_segment().map(str::to_string));
        let op: &RpcOperation = match name.as_deref().and_then(|n| route.get(n)) {
            Some(op) => op,
            None => return EngineResponse::error(400, "Invalid RPC operation."),
        };

        let options = match self.run_middleware(req, &route.middleware, &op.middleware) {
            ChainResult::Continue(options) => options,
            ChainResult::Terminal(res) => return res,
        };

        match self.validate_input(req, op.input.as_ref()) {
            Ok((body, query, params)) => {
                self.dispatch(req, op.handler.as_deref(), body, query, params, options)
            }
            Err(res) => res,
        }
    }

    /// Produce the OpenAPI fragment for a route. This is the explicit twin of
    /// [`handle`](Self::handle): the synchronizer reaches it through the
    /// introspection marker carried over ordinary request transport.
    pub fn describe(&self, pattern: &str, route: &Route) -> anyhow::Result<OasFragment> {
        aggregate::aggregate_route(pattern, route, &self.ledger)
    }

    /// RPC counterpart of [`describe`](Self::describe).
    pub fn describe_rpc(&self, pattern: &str, route: &RpcRoute) -> anyhow::Result<OasFragment> {
        aggregate::aggregate_rpc_route(pattern, route, &self.ledger)
    }

    /// Answer introspection requests before any business logic runs.
    ///
    /// Reachable only outside production: the marker is a protocol-level
    /// trust boundary, so production answers 403 unconditionally.
    fn introspection_short_circuit(
        &self,
        req: &EngineRequest,
        describe: impl FnOnce() -> anyhow::Result<OasFragment>,
    ) -> Option<EngineResponse> {
        if req.user_agent() != Some(INTROSPECTION_USER_AGENT) {
            return None;
        }
        if self.env.is_production() {
            return Some(EngineResponse::error(403, "Forbidden."));
        }
        Some(match describe() {
            Ok(fragment) => match serde_json::to_value(&fragment) {
                Ok(body) => EngineResponse::json(200, body),
                Err(err) => EngineResponse::error(
                    500,
                    &format!("OpenAPI aggregation failed for {}: {err}", req.path),
                ),
            },
            Err(err) => EngineResponse::error(
                500,
                &format!("OpenAPI aggregation failed for {}: {err}", req.path),
            ),
        })
    }

    /// Run route-level then operation-level middleware, threading the
    /// accumulated options. A terminal response short-circuits; an erroring
    /// middleware terminates with a 500 and the handler never runs.
    fn run_middleware(
        &self,
        req: &EngineRequest,
        route_chain: &[Arc<dyn Middleware>],
        op_chain: &[Arc<dyn Middleware>],
    ) -> ChainResult {
        let mut options = Map::new();
        for middleware in route_chain.iter().chain(op_chain) {
            match middleware.call(req, &options) {
                Ok(MiddlewareOutcome::Pass) => {}
                Ok(MiddlewareOutcome::Merge(partial)) => {
                    for (key, value) in partial {
                        options.insert(key, value);
                    }
                }
                Ok(MiddlewareOutcome::Respond(res)) => return ChainResult::Terminal(res),
                Err(err) => {
                    error!(
                        request_id = %req.request_id,
                        path = %req.path,
                        error = %err,
                        "middleware failed"
                    );
                    return ChainResult::Terminal(EngineResponse::error(
                        500,
                        UNEXPECTED_ERROR_MESSAGE,
                    ));
                }
            }
        }
        ChainResult::Continue(options)
    }

    /// Content-type check, then body, then query, then path params. Each
    /// failure category gets a distinct message so clients can tell them
    /// apart.
    #[allow(clippy::type_complexity)]
    fn validate_input(
        &self,
        req: &EngineRequest,
        input: Option<&Input>,
    ) -> Result<(Option<Value>, Option<Value>, Option<Value>), EngineResponse> {
        let Some(input) = input else {
            return Ok((None, None, None));
        };

        if let Some(expected) = &input.content_type {
            let actual = req.content_type();
            if actual != Some(expected.as_str()) {
                return Err(EngineResponse::error(415, "Invalid media type."));
            }
        }

        let body = match &input.body {
            Some(schema) => Some(self.validate_body(req, schema.as_ref())?),
            None => None,
        };

        let query = match &input.query {
            Some(schema) => Some(self.validate_params(
                &req.query_params,
                schema.as_ref(),
                "Invalid query parameters.",
            )?),
            None => None,
        };

        let params = match &input.params {
            Some(schema) => Some(self.validate_params(
                &req.path_params,
                schema.as_ref(),
                "Invalid path parameters.",
            )?),
            None => None,
        };

        Ok((body, query, params))
    }

    fn validate_body(
        &self,
        req: &EngineRequest,
        schema: &dyn SchemaDescriptor,
    ) -> Result<Value, EngineResponse> {
        let parsed: Value = match req.body.as_deref() {
            Some(bytes) if !bytes.is_empty() => match serde_json::from_slice(bytes) {
                Ok(value) => value,
                Err(_) => return Err(EngineResponse::error(400, "Missing request body.")),
            },
            _ => return Err(EngineResponse::error(400, "Missing request body.")),
        };
        match schema.validate(&parsed) {
            Validated::Valid(data) => Ok(data),
            Validated::Invalid(issues) => Err(EngineResponse::validation_error(
                400,
                "Invalid request body.",
                &issues,
            )),
        }
    }

    fn validate_params(
        &self,
        raw: &std::collections::HashMap<String, String>,
        schema: &dyn SchemaDescriptor,
        message: &str,
    ) -> Result<Value, EngineResponse> {
        let mut object = Map::new();
        for (key, value) in raw {
            object.insert(key.clone(), coerce_param(value, schema.field_type(key)));
        }
        match schema.validate(&Value::Object(object)) {
            Validated::Valid(data) => Ok(data),
            Validated::Invalid(issues) => {
                Err(EngineResponse::validation_error(400, message, &issues))
            }
        }
    }

    /// Invoke the handler with validated input. A missing handler is a
    /// configuration error deliberately caught here, not at construction, so
    /// documentation-only operations stay legal.
    fn dispatch(
        &self,
        req: &EngineRequest,
        handler: Option<&(dyn Fn(HandlerArgs) -> anyhow::Result<EngineResponse> + Send + Sync)>,
        body: Option<Value>,
        query: Option<Value>,
        params: Option<Value>,
        options: Map<String, Value>,
    ) -> EngineResponse {
        let Some(handler) = handler else {
            error!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                "no handler registered for operation"
            );
            return EngineResponse::error(501, "Handler not found.");
        };

        let args = HandlerArgs {
            request_id: req.request_id,
            body,
            query,
            params,
            options,
        };
        match handler(args) {
            Ok(res) => {
                info!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    status = res.status,
                    "request handled"
                );
                res
            }
            Err(err) => {
                if self.env.is_production() {
                    error!(request_id = %req.request_id, path = %req.path, "handler failed");
                } else {
                    error!(
                        request_id = %req.request_id,
                        path = %req.path,
                        error = ?err,
                        "handler failed"
                    );
                }
                EngineResponse::error(500, UNEXPECTED_ERROR_MESSAGE)
            }
        }
    }
}
