//! # Spec Synchronizer
//!
//! Assembles the full OpenAPI document from per-route fragments and keeps
//! the persisted copy in step with the code. Fragments are obtained by
//! probing each route through the same transport ordinary requests use: a
//! request carrying the introspection user-agent marker, answered by the
//! engine with the route's fragment instead of handler output. Because the
//! probe path and the serving path are the same code, the generated document
//! can never drift from what the engine actually enforces.
//!
//! Probing is concurrent with a per-pass deadline, and a route that fails to
//! describe itself is logged and skipped rather than failing the pass, so one
//! broken route never blanks the whole document.

use anyhow::Context;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::aggregate::{deep_merge, OasFragment};
use crate::config::Config;
use crate::discovery::{DiscoveredRoute, RouteFileKind};
use crate::engine::{EngineRequest, ValidationEngine, INTROSPECTION_USER_AGENT};
use crate::registry::{RouteEntry, RouteRegistry};

/// Obtains the OpenAPI fragment for one discovered route.
///
/// The production implementation is [`InProcessProbe`]; tests substitute
/// their own to exercise failure and timeout handling.
pub trait RouteProbe: Send + Sync {
    fn describe(&self, route: &DiscoveredRoute) -> anyhow::Result<OasFragment>;
}

/// Probes routes by driving the engine directly with marker requests.
pub struct InProcessProbe {
    engine: Arc<ValidationEngine>,
    registry: Arc<RouteRegistry>,
}

impl InProcessProbe {
    pub fn new(engine: Arc<ValidationEngine>, registry: Arc<RouteRegistry>) -> Self {
        Self { engine, registry }
    }
}

impl RouteProbe for InProcessProbe {
    fn describe(&self, route: &DiscoveredRoute) -> anyhow::Result<OasFragment> {
        let pattern = match &route.kind {
            RouteFileKind::RpcDispatcher { base } => base.as_str(),
            _ => route.url_path.as_str(),
        };
        let entry = self
            .registry
            .get(pattern)
            .with_context(|| format!("no registered route for {pattern}"))?;

        let req = EngineRequest::new(http::Method::GET, &route.url_path)
            .header("user-agent", INTROSPECTION_USER_AGENT);
        let res = match entry {
            RouteEntry::Plain(route) => self.engine.handle(pattern, route, &req),
            RouteEntry::Rpc(route) => self.engine.handle_rpc(pattern, route, &req),
        };
        if res.status != 200 {
            anyhow::bail!("introspection of {pattern} returned status {}", res.status);
        }
        serde_json::from_value(res.body)
            .with_context(|| format!("introspection of {pattern} returned a malformed fragment"))
    }
}

/// What a synchronization pass concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The persisted document differed and was rewritten.
    Written,
    /// The persisted document already matches.
    UpToDate,
    /// Validate-only mode found a difference (or no file at all).
    Stale,
}

/// Result of collecting fragments across all routes.
#[derive(Debug, Default)]
pub struct CollectReport {
    pub fragment: OasFragment,
    /// Routes that failed to describe themselves or missed the deadline.
    pub failed: Vec<String>,
}

pub struct SpecSync {
    config: Config,
    probe: Arc<dyn RouteProbe>,
    timeout: Duration,
}

impl SpecSync {
    pub fn new(config: Config, probe: Arc<dyn RouteProbe>, timeout: Duration) -> Self {
        Self {
            config,
            probe,
            timeout,
        }
    }

    /// Probe every route concurrently and merge the fragments. Pattern order
    /// of the merge is fixed regardless of completion order, so repeated
    /// passes over unchanged routes produce byte-identical documents.
    pub fn collect(&self, routes: &[DiscoveredRoute]) -> CollectReport {
        let (tx, rx) = mpsc::channel::<(String, anyhow::Result<OasFragment>)>();
        let mut pending = 0usize;
        for route in routes {
            let tx = tx.clone();
            let probe = Arc::clone(&self.probe);
            let route = route.clone();
            std::thread::spawn(move || {
                let result = probe.describe(&route);
                // The receiver may have given up on the deadline already.
                let _ = tx.send((route.url_path.clone(), result));
            });
            pending += 1;
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        let mut fragments: Vec<(String, OasFragment)> = Vec::new();
        let mut failed = Vec::new();
        let mut answered = std::collections::HashSet::new();
        while pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((path, Ok(fragment))) => {
                    answered.insert(path.clone());
                    fragments.push((path, fragment));
                    pending -= 1;
                }
                Ok((path, Err(err))) => {
                    answered.insert(path.clone());
                    error!(path = %path, error = %err, "route introspection failed");
                    failed.push(path);
                    pending -= 1;
                }
                Err(_) => {
                    for route in routes {
                        if !answered.contains(&route.url_path) {
                            error!(path = %route.url_path, "route introspection timed out");
                            failed.push(route.url_path.clone());
                        }
                    }
                    break;
                }
            }
        }

        fragments.sort_by(|(a, _), (b, _)| a.cmp(b));
        let mut merged = OasFragment::default();
        for (_, fragment) in fragments {
            merged.merge(fragment);
        }
        failed.sort();
        CollectReport {
            fragment: merged,
            failed,
        }
    }

    /// Assemble the complete OpenAPI 3.1 document from the merged fragment
    /// and the configured overrides.
    pub fn assemble(&self, fragment: &OasFragment) -> Value {
        let mut info = Map::new();
        info.insert("title".to_string(), json!(self.config.docs.title));
        if !self.config.docs.description.is_empty() {
            info.insert(
                "description".to_string(),
                json!(self.config.docs.description),
            );
        }

        let mut document = json!({
            "openapi": "3.1.0",
            "info": Value::Object(info),
            "paths": fragment.paths,
        });
        if !fragment.schemas.is_empty() {
            document["components"] = json!({ "schemas": fragment.schemas });
        }
        if let Some(overrides) = &self.config.spec_overrides {
            deep_merge(&mut document, overrides);
        }
        document
    }

    /// Regenerate the document and persist it at `path` when it differs from
    /// what is already on disk. Comparison is structural, so formatting-only
    /// differences do not trigger a rewrite.
    pub fn sync_to_file(
        &self,
        routes: &[DiscoveredRoute],
        path: &Path,
    ) -> anyhow::Result<SyncOutcome> {
        let report = self.collect(routes);
        let document = self.assemble(&report.fragment);

        if read_existing(path)?.as_ref() == Some(&document) {
            if !self.config.suppress_info {
                info!(file = %path.display(), "OpenAPI document is up to date");
            }
            return Ok(SyncOutcome::UpToDate);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut rendered = serde_json::to_string_pretty(&document)?;
        rendered.push('\n');
        std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?;
        if !self.config.suppress_info {
            info!(
                file = %path.display(),
                routes = routes.len(),
                failed = report.failed.len(),
                "regenerated OpenAPI document"
            );
        }
        Ok(SyncOutcome::Written)
    }

    /// Check whether the persisted document matches without writing anything.
    pub fn validate_file(
        &self,
        routes: &[DiscoveredRoute],
        path: &Path,
    ) -> anyhow::Result<SyncOutcome> {
        let report = self.collect(routes);
        let document = self.assemble(&report.fragment);
        match read_existing(path)? {
            Some(existing) if existing == document => Ok(SyncOutcome::UpToDate),
            _ => Ok(SyncOutcome::Stale),
        }
    }
}

/// Parse the persisted document; an absent file is simply no prior document,
/// while an unreadable or unparseable one is an error worth surfacing.
fn read_existing(path: &Path) -> anyhow::Result<Option<Value>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("existing document {} is not valid JSON", path.display()))?;
            Ok(Some(value))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::BTreeMap;

    struct StaticProbe;

    impl RouteProbe for StaticProbe {
        fn describe(&self, route: &DiscoveredRoute) -> anyhow::Result<OasFragment> {
            if route.url_path.contains("broken") {
                anyhow::bail!("boom");
            }
            let mut paths = BTreeMap::new();
            paths.insert(route.url_path.clone(), json!({ "get": {} }));
            Ok(OasFragment {
                paths,
                schemas: BTreeMap::new(),
            })
        }
    }

    fn route(path: &str) -> DiscoveredRoute {
        DiscoveredRoute {
            file: std::path::PathBuf::from(format!("app{path}/route.rs")),
            url_path: path.to_string(),
            kind: RouteFileKind::Route,
        }
    }

    fn sync() -> SpecSync {
        SpecSync::new(
            Config::default(),
            Arc::new(StaticProbe),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_collect_merges_in_pattern_order() {
        let routes = vec![route("/api/zeta"), route("/api/alpha")];
        let report = sync().collect(&routes);
        let keys: Vec<&String> = report.fragment.paths.keys().collect();
        assert_eq!(keys, vec!["/api/alpha", "/api/zeta"]);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_failed_probe_is_isolated() {
        let routes = vec![route("/api/ok"), route("/api/broken")];
        let report = sync().collect(&routes);
        assert_eq!(report.failed, vec!["/api/broken"]);
        assert!(report.fragment.paths.contains_key("/api/ok"));
        assert!(!report.fragment.paths.contains_key("/api/broken"));
    }

    #[test]
    fn test_assemble_wraps_fragment_and_applies_overrides() {
        let mut config = Config::default();
        config.docs.title = "Todo API".to_string();
        config.spec_overrides = Some(json!({ "info": { "version": "2.0.0" } }));
        let spec_sync = SpecSync::new(config, Arc::new(StaticProbe), Duration::from_secs(5));
        let report = spec_sync.collect(&[route("/api/todos")]);
        let document = spec_sync.assemble(&report.fragment);
        assert_eq!(document["openapi"], "3.1.0");
        assert_eq!(document["info"]["title"], "Todo API");
        assert_eq!(document["info"]["version"], "2.0.0");
        assert!(document["paths"]["/api/todos"].is_object());
        assert!(document.get("components").is_none());
    }

    #[test]
    fn test_sync_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("openapi.json");
        let routes = vec![route("/api/todos")];
        let spec_sync = sync();
        assert_eq!(
            spec_sync.sync_to_file(&routes, &file).unwrap(),
            SyncOutcome::Written
        );
        let first = std::fs::read_to_string(&file).unwrap();
        assert_eq!(
            spec_sync.sync_to_file(&routes, &file).unwrap(),
            SyncOutcome::UpToDate
        );
        assert_eq!(std::fs::read_to_string(&file).unwrap(), first);
    }

    #[test]
    fn test_validate_reports_staleness_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("openapi.json");
        let routes = vec![route("/api/todos")];
        let spec_sync = sync();
        assert_eq!(
            spec_sync.validate_file(&routes, &file).unwrap(),
            SyncOutcome::Stale
        );
        assert!(!file.exists());
        spec_sync.sync_to_file(&routes, &file).unwrap();
        assert_eq!(
            spec_sync.validate_file(&routes, &file).unwrap(),
            SyncOutcome::UpToDate
        );
    }
}
