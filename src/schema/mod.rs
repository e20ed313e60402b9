//! # Schema Adapter
//!
//! Polymorphic facade over schema descriptions. Route authors declare input
//! and output schemas as opaque [`SchemaDescriptor`] values; the validation
//! engine uses them to check incoming payloads and the aggregator converts
//! them to JSON Schema fragments for the OpenAPI document.
//!
//! The adapter boundary is a trait rather than duck-typed property sniffing:
//! each underlying schema representation gets one adapter implementation,
//! selected once at construction. [`JsonSchema`] adapts raw JSON Schema
//! documents (compiled through the `jsonschema` crate); [`dsl::TypedSchema`]
//! is a programmatic builder that lowers to the same adapter.
//!
//! Two hard rules hold at this boundary:
//!
//! - `validate` never fails for a value that merely mismatches the schema;
//!   that is a normal [`Validated::Invalid`] result. Construction fails for a
//!   structurally invalid schema (programmer error).
//! - `to_json_schema` never aborts document generation. A shape it cannot
//!   convert degrades to an empty fragment and a structured event on the
//!   [`WarnLedger`](crate::telemetry::WarnLedger).

mod json_schema;

pub mod dsl;

pub use json_schema::JsonSchema;

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::telemetry::WarnLedger;

/// A single validation failure, pointing at the offending field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SchemaIssue {
    /// JSON pointer to the failing part of the instance (empty for the root).
    pub path: String,
    /// Human-readable description of the failure.
    pub message: String,
}

/// Outcome of validating a value against a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    /// The value matched; carries the value the handler should receive.
    Valid(Value),
    /// The value mismatched; carries at least one issue.
    Invalid(Vec<SchemaIssue>),
}

impl Validated {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validated::Valid(_))
    }

    /// The validated value, if any.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Validated::Valid(v) => Some(v),
            Validated::Invalid(_) => None,
        }
    }

    /// The issue list, if validation failed.
    pub fn issues(&self) -> Option<&[SchemaIssue]> {
        match self {
            Validated::Valid(_) => None,
            Validated::Invalid(issues) => Some(issues),
        }
    }
}

/// Which part of an operation a schema describes.
///
/// Carried into conversion so degradation warnings can identify the exact
/// operation and field role without a stack trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaRole {
    RequestBody,
    ResponseBody(u16),
    Query,
    PathParams,
}

impl fmt::Display for SchemaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaRole::RequestBody => write!(f, "requestBody"),
            SchemaRole::ResponseBody(status) => write!(f, "responseBody {status}"),
            SchemaRole::Query => write!(f, "query"),
            SchemaRole::PathParams => write!(f, "pathParams"),
        }
    }
}

/// Context for a schema-to-JSON-Schema conversion.
#[derive(Debug, Clone, Copy)]
pub struct ConversionContext<'a> {
    pub operation_id: &'a str,
    pub role: SchemaRole,
    pub ledger: &'a WarnLedger,
}

/// Adapter contract over one schema-description representation.
pub trait SchemaDescriptor: Send + Sync + fmt::Debug {
    /// Validate `value`, returning the value the handler should receive on
    /// success or the issue list on mismatch.
    fn validate(&self, value: &Value) -> Validated;

    /// Convert to a JSON Schema fragment, preserving per-field descriptions
    /// recursively. Degrades to `{}` (never panics or errors) on shapes the
    /// adapter cannot express, recording the degradation on the ledger.
    fn to_json_schema(&self, ctx: &ConversionContext<'_>) -> Value;

    /// Top-level field names of an object-shaped schema. Errors if the schema
    /// is not an object: query and path parameters must be objects.
    fn extract_keys(&self) -> anyhow::Result<Vec<String>>;

    /// The declared JSON type of one top-level field, used for query/path
    /// parameter string coercion. `None` when unknown.
    fn field_type(&self, key: &str) -> Option<FieldType>;
}

/// Primitive type hints for parameter coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

/// Shared handle to a schema descriptor as stored on operations.
pub type SchemaRef = Arc<dyn SchemaDescriptor>;
