use http::Method;
use serde_json::Value;
use std::collections::HashMap;

use crate::ids::RequestId;
use crate::schema::FieldType;

/// Parsed HTTP request data consumed by the validation engine.
///
/// The host framework's wrapper constructs one of these per incoming request;
/// header keys are lowercased, the query string is already split off the
/// path, and the body is kept as raw bytes so the engine owns JSON parsing
/// (and its failure modes).
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub request_id: RequestId,
    pub method: Method,
    /// Request path without the query string.
    pub path: String,
    /// HTTP headers (lowercase keys).
    pub headers: HashMap<String, String>,
    /// Parsed query string parameters.
    pub query_params: HashMap<String, String>,
    /// Path parameters extracted by the host router.
    pub path_params: HashMap<String, String>,
    /// Raw request body, if any.
    pub body: Option<Vec<u8>>,
}

impl EngineRequest {
    /// Build a request from a method and a path that may carry a query string.
    pub fn new(method: Method, path: &str) -> Self {
        let (path_only, query) = match path.split_once('?') {
            Some((p, q)) => (p, q),
            None => (path, ""),
        };
        let query_params = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            request_id: RequestId::new(),
            method,
            path: path_only.to_string(),
            headers: HashMap::new(),
            query_params,
            path_params: HashMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// JSON body shorthand; also sets the content type.
    pub fn json_body(mut self, body: &Value) -> Self {
        self.body = Some(body.to_string().into_bytes());
        self.header("content-type", "application/json")
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.get_header("user-agent")
    }

    /// Content type with `;`-delimited parameters stripped.
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
    }

    /// Final path segment, used as the RPC operation fallback key.
    pub fn last_path_segment(&self) -> Option<&str> {
        self.path.rsplit('/').find(|s| !s.is_empty())
    }
}

/// Convert a raw parameter string to the JSON type its schema declares.
///
/// Query and path parameters arrive as strings; declared schemas often expect
/// integers or booleans. The handler receives the coerced value, so schemas
/// and handler types line up. A value that does not parse is left as a string
/// and fails schema validation with a field-level issue instead of a blanket
/// parse error.
pub fn coerce_param(value: &str, field_type: Option<FieldType>) -> Value {
    match field_type {
        Some(FieldType::Integer) => value
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        Some(FieldType::Number) => value
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        Some(FieldType::Boolean) => value
            .parse::<bool>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        Some(FieldType::Array) => Value::Array(
            value
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.trim().to_string()))
                .collect(),
        ),
        Some(FieldType::Object) => {
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
        }
        Some(FieldType::String) | None => Value::String(value.to_string()),
    }
}
