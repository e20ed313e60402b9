//! # Route Discovery & Filtering
//!
//! Enumerates candidate route files under the configured directory roots,
//! classifies them by structural role, derives their URL patterns, and
//! applies the allow/deny glob filters. Two file-system routing conventions
//! coexist: nested `route` files (app-directory style) and leaf-file-name
//! routes (pages/api style).
//!
//! Catch-all routes are always excluded from aggregation (their method set
//! is dynamic, not statically known), and the configured docs/spec endpoints
//! are excluded to avoid self-referential generation. Everything excluded is
//! collected into the report and logged once per pass, not per path.

mod glob;

pub use glob::{is_allowed, is_wildcard_match};

use anyhow::Context;
use std::path::{Component, Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::config::Config;

/// Which routing convention a discovery root follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Nested directories with `route.*` leaf files; the directory path is
    /// the URL path.
    AppDir,
    /// Every file is a route; the file path (minus extension) is the URL
    /// path under the root's base URL.
    PagesApi,
}

/// One directory tree to scan.
#[derive(Debug, Clone)]
pub struct DiscoveryRoot {
    pub dir: PathBuf,
    pub kind: RootKind,
    /// URL prefix for routes found under this root (e.g. `/api` for a
    /// pages-style API root). Empty for roots whose directories already
    /// spell the full path.
    pub base_url: String,
}

impl DiscoveryRoot {
    pub fn app_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            kind: RootKind::AppDir,
            base_url: String::new(),
        }
    }

    pub fn pages_api(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            kind: RootKind::PagesApi,
            base_url: base_url.into(),
        }
    }
}

/// Structural role of a discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteFileKind {
    /// Ordinary route: statically known method set, aggregated normally.
    Route,
    /// Contains a `[...x]` segment; method set is dynamic, never aggregated.
    CatchAll,
    /// Trailing `rpc/{operationId}` pattern; aggregated per-operation.
    /// Carries the dispatcher base route (the pattern minus the dynamic
    /// operation segment).
    RpcDispatcher { base: String },
    /// The configured docs/spec endpoint itself.
    Reserved,
}

/// One candidate route file with its derived URL pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRoute {
    pub file: PathBuf,
    pub url_path: String,
    pub kind: RouteFileKind,
}

/// Why a path was left out of aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    CatchAll,
    Reserved,
    Filtered,
}

/// Result of one discovery pass.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Included candidates (ordinary routes and RPC dispatchers).
    pub routes: Vec<DiscoveredRoute>,
    /// Excluded paths with the reason, for one aggregated log line.
    pub ignored: Vec<(String, IgnoreReason)>,
}

impl DiscoveryReport {
    /// Log the excluded paths once for the whole pass.
    pub fn log_summary(&self, suppress_info: bool) {
        if suppress_info || self.ignored.is_empty() {
            return;
        }
        let paths: Vec<&str> = self.ignored.iter().map(|(p, _)| p.as_str()).collect();
        info!(
            included = self.routes.len(),
            ignored = paths.len(),
            ignored_paths = ?paths,
            "route discovery pass complete"
        );
    }
}

/// Convert a `[param]` segment to `{param}` brace syntax.
fn normalize_segment(segment: &str) -> String {
    match segment
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(inner) => format!("{{{inner}}}"),
        None => segment.to_string(),
    }
}

// Both the raw bracket form and the brace form produced by
// `normalize_segment` count.
fn is_catch_all_segment(segment: &str) -> bool {
    segment.starts_with("[...") || segment.starts_with("{...")
}

/// Derive the URL pattern for a file under a root, or `None` for files that
/// are not route files under the root's convention.
fn derive_url_path(root: &DiscoveryRoot, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(&root.dir).ok()?;
    let mut segments: Vec<String> = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            segments.push(part.to_string_lossy().to_string());
        }
    }
    let file_name = segments.pop()?;
    let stem = file_name.rsplit_once('.').map_or(file_name.as_str(), |(s, _)| s);

    match root.kind {
        RootKind::AppDir => {
            if stem != "route" {
                return None;
            }
        }
        RootKind::PagesApi => {
            if stem != "index" {
                segments.push(stem.to_string());
            }
        }
    }

    let mut url = root.base_url.trim_end_matches('/').to_string();
    for segment in &segments {
        url.push('/');
        url.push_str(&normalize_segment(segment));
    }
    if url.is_empty() {
        url.push('/');
    }
    Some(url)
}

/// Classify a derived URL pattern.
fn classify(url_path: &str, reserved: &[String]) -> RouteFileKind {
    let segments: Vec<&str> = url_path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| is_catch_all_segment(s)) {
        return RouteFileKind::CatchAll;
    }
    if reserved.iter().any(|r| r == url_path) {
        return RouteFileKind::Reserved;
    }
    if segments.len() >= 2
        && segments[segments.len() - 2] == "rpc"
        && segments[segments.len() - 1] == "{operationId}"
    {
        let base = url_path
            .trim_end_matches("{operationId}")
            .trim_end_matches('/')
            .to_string();
        return RouteFileKind::RpcDispatcher { base };
    }
    RouteFileKind::Route
}

/// Walk the configured roots and produce the filtered candidate set.
///
/// # Errors
///
/// Fails if a configured root does not exist: discovery roots are part of
/// the deployment configuration, and a missing one is a setup error rather
/// than an empty result.
pub fn discover(roots: &[DiscoveryRoot], config: &Config) -> anyhow::Result<DiscoveryReport> {
    let reserved = config.reserved_paths();
    let mut report = DiscoveryReport::default();

    for root in roots {
        if !root.dir.is_dir() {
            anyhow::bail!("discovery root does not exist: {}", root.dir.display());
        }
        let mut entries: Vec<PathBuf> = WalkDir::new(&root.dir)
            .into_iter()
            .filter_entry(|e| {
                // Skip hidden entries, but never the root itself.
                e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
            })
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        entries.sort();

        for file in entries {
            let Some(url_path) = derive_url_path(root, &file) else {
                continue;
            };
            let kind = classify(&url_path, &reserved);
            match kind {
                RouteFileKind::CatchAll => {
                    report.ignored.push((url_path, IgnoreReason::CatchAll));
                }
                RouteFileKind::Reserved => {
                    report.ignored.push((url_path, IgnoreReason::Reserved));
                }
                kind => {
                    if is_allowed(&url_path, &config.allowed_paths, &config.denied_paths) {
                        report.routes.push(DiscoveredRoute {
                            file,
                            url_path,
                            kind,
                        });
                    } else {
                        report.ignored.push((url_path, IgnoreReason::Filtered));
                    }
                }
            }
        }
    }

    report
        .routes
        .sort_by(|a, b| a.url_path.cmp(&b.url_path));
    Ok(report)
}

/// Convenience wrapper that also emits the summary log line.
pub fn discover_and_report(
    roots: &[DiscoveryRoot],
    config: &Config,
) -> anyhow::Result<DiscoveryReport> {
    let report = discover(roots, config).context("route discovery failed")?;
    report.log_summary(config.suppress_info);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_segment() {
        assert_eq!(normalize_segment("[id]"), "{id}");
        assert_eq!(normalize_segment("todos"), "todos");
    }

    #[test]
    fn test_classify_catch_all() {
        assert_eq!(classify("/api/[...slug]", &[]), RouteFileKind::CatchAll);
        assert_eq!(classify("/api/{...slug}", &[]), RouteFileKind::CatchAll);
    }

    #[test]
    fn test_classify_rpc_dispatcher() {
        assert_eq!(
            classify("/api/rpc/{operationId}", &[]),
            RouteFileKind::RpcDispatcher {
                base: "/api/rpc".to_string()
            }
        );
    }

    #[test]
    fn test_classify_reserved() {
        let reserved = vec!["/openapi.json".to_string()];
        assert_eq!(classify("/openapi.json", &reserved), RouteFileKind::Reserved);
    }

    #[test]
    fn test_derive_app_dir_path() {
        let root = DiscoveryRoot::app_dir("/app");
        assert_eq!(
            derive_url_path(&root, Path::new("/app/api/todos/[id]/route.rs")),
            Some("/api/todos/{id}".to_string())
        );
        assert_eq!(
            derive_url_path(&root, Path::new("/app/api/todos/helpers.rs")),
            None
        );
    }

    #[test]
    fn test_derive_pages_api_path() {
        let root = DiscoveryRoot::pages_api("/pages/api", "/api");
        assert_eq!(
            derive_url_path(&root, Path::new("/pages/api/todos.rs")),
            Some("/api/todos".to_string())
        );
        assert_eq!(
            derive_url_path(&root, Path::new("/pages/api/todos/index.rs")),
            Some("/api/todos".to_string())
        );
        assert_eq!(
            derive_url_path(&root, Path::new("/pages/api/todos/[id].rs")),
            Some("/api/todos/{id}".to_string())
        );
    }
}
