use serde_json::{json, Value};
use smallvec::SmallVec;
use std::sync::Arc;

use crate::schema::SchemaIssue;

/// Maximum inline headers before heap allocation. Engine responses rarely
/// carry more than a content type and an `Allow` header.
pub const MAX_INLINE_HEADERS: usize = 8;

/// Stack-allocated response header storage. Header names are `Arc<str>`
/// because the same names repeat across responses.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Response produced by the validation engine or a handler.
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub status: u16,
    pub headers: HeaderVec,
    /// Response body as JSON.
    pub body: Value,
}

impl EngineResponse {
    /// JSON response with the content type preset.
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Structured client error: `{ "message": ... }`.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "message": message }))
    }

    /// Schema validation failure: `{ "message": ..., "errors": [...] }`.
    pub fn validation_error(status: u16, message: &str, issues: &[SchemaIssue]) -> Self {
        Self::json(status, json!({ "message": message, "errors": issues }))
    }

    /// 405 with the route's declared methods in `Allow`.
    pub fn method_not_allowed(allow: &str) -> Self {
        Self::error(405, "Method not allowed.").with_header("allow", allow)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Add or replace a header (names compared case-insensitively).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            entry.1 = value;
        } else {
            self.headers.push((Arc::from(name.to_ascii_lowercase()), value));
        }
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let res = EngineResponse::method_not_allowed("GET, POST");
        assert_eq!(res.status, 405);
        assert_eq!(res.get_header("Allow"), Some("GET, POST"));
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut res = EngineResponse::json(200, json!({}));
        res.set_header("Content-Type", "text/html");
        assert_eq!(res.get_header("content-type"), Some("text/html"));
        assert_eq!(res.headers.len(), 1);
    }

    #[test]
    fn test_error_body_shape() {
        let res = EngineResponse::error(400, "Missing request body.");
        assert_eq!(res.body, json!({ "message": "Missing request body." }));
    }
}
