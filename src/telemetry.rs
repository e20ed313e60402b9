//! Deduplicated warning ledger shared by the aggregator and the docs layer.
//!
//! Schema conversion degrades gracefully: a shape the adapter cannot express
//! becomes an empty fragment plus a structured event on this ledger. The
//! ledger is constructor-scoped and passed by reference, so "log once per
//! process lifetime" behavior does not depend on ambient global state, and
//! operators (and tests) can inspect degradations programmatically instead of
//! scraping console output.

use std::collections::HashSet;
use std::sync::Mutex;
use tracing::warn;

/// A structured record of a schema that could not be fully converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedSchema {
    /// Operation the schema belongs to.
    pub operation_id: String,
    /// Which part of the operation degraded ("requestBody", "responseBody 200", ...).
    pub role: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Warning deduplication and degradation event sink.
///
/// Races on the dedup set only affect log verbosity, never behavior.
#[derive(Debug, Default)]
pub struct WarnLedger {
    seen: Mutex<HashSet<String>>,
    degraded: Mutex<Vec<DegradedSchema>>,
}

impl WarnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `message` at warn level the first time `key` is seen on this ledger.
    pub fn warn_once(&self, key: &str, message: &str) {
        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if seen.insert(key.to_string()) {
            warn!(key = key, "{message}");
        }
    }

    /// Record (and warn once about) a schema that degraded to an empty fragment.
    pub fn record_degraded(&self, operation_id: &str, role: &str, reason: &str) {
        let key = format!("degraded:{operation_id}:{role}");
        self.warn_once(
            &key,
            &format!(
                "schema for operation {operation_id} ({role}) could not be converted: {reason}; \
                 emitting empty schema"
            ),
        );
        let mut degraded = match self.degraded.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        degraded.push(DegradedSchema {
            operation_id: operation_id.to_string(),
            role: role.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Snapshot of all degradation events recorded so far.
    pub fn degraded(&self) -> Vec<DegradedSchema> {
        match self.degraded.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_dedupes_by_key() {
        let ledger = WarnLedger::new();
        ledger.warn_once("k", "first");
        ledger.warn_once("k", "second");
        let seen = ledger.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_degraded_events_recorded() {
        let ledger = WarnLedger::new();
        ledger.record_degraded("get_todo", "requestBody", "unsupported shape");
        ledger.record_degraded("get_todo", "requestBody", "unsupported shape");
        let events = ledger.degraded();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].operation_id, "get_todo");
        assert_eq!(events[0].role, "requestBody");
    }
}
