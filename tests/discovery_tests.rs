use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

use restframe::config::Config;
use restframe::discovery::{self, DiscoveryRoot, IgnoreReason, RouteFileKind};

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

fn sample_app(dir: &Path) {
    touch(&dir.join("api/todos/route.rs"));
    touch(&dir.join("api/todos/[id]/route.rs"));
    touch(&dir.join("api/todos/helpers.rs"));
    touch(&dir.join("api/[...slug]/route.rs"));
    touch(&dir.join("api/rpc/[operationId]/route.rs"));
    touch(&dir.join("api/internal/debug/route.rs"));
    touch(&dir.join(".hidden/route.rs"));
}

#[test]
fn test_discovery_classifies_and_filters() {
    let tmp = tempfile::tempdir().unwrap();
    sample_app(tmp.path());

    let mut config = Config::default();
    config.denied_paths = vec!["/api/internal/**".to_string()];
    let roots = vec![DiscoveryRoot::app_dir(tmp.path())];
    let report = discovery::discover(&roots, &config).unwrap();

    let included: Vec<(&str, &RouteFileKind)> = report
        .routes
        .iter()
        .map(|r| (r.url_path.as_str(), &r.kind))
        .collect();
    assert_eq!(
        included,
        vec![
            (
                "/api/rpc/{operationId}",
                &RouteFileKind::RpcDispatcher {
                    base: "/api/rpc".to_string()
                }
            ),
            ("/api/todos", &RouteFileKind::Route),
            ("/api/todos/{id}", &RouteFileKind::Route),
        ]
    );

    assert!(report
        .ignored
        .iter()
        .any(|(p, r)| p.contains("slug") && *r == IgnoreReason::CatchAll));
    assert!(report
        .ignored
        .contains(&("/api/internal/debug".to_string(), IgnoreReason::Filtered)));
    // Helpers next to route files and hidden directories are not candidates.
    assert!(!report.ignored.iter().any(|(p, _)| p.contains("helpers")));
    assert!(!report.routes.iter().any(|r| r.url_path.contains("hidden")));
}

#[test]
fn test_reserved_paths_are_excluded() {
    let tmp = tempfile::tempdir().unwrap();
    touch(&tmp.path().join("openapi.json/route.rs"));
    touch(&tmp.path().join("api/docs/route.rs"));
    touch(&tmp.path().join("api/todos/route.rs"));

    let config = Config::default();
    let roots = vec![DiscoveryRoot::app_dir(tmp.path())];
    let report = discovery::discover(&roots, &config).unwrap();

    assert_eq!(report.routes.len(), 1);
    assert_eq!(report.routes[0].url_path, "/api/todos");
    assert!(report
        .ignored
        .contains(&("/openapi.json".to_string(), IgnoreReason::Reserved)));
    assert!(report
        .ignored
        .contains(&("/api/docs".to_string(), IgnoreReason::Reserved)));
}

#[test]
fn test_pages_style_root() {
    let tmp = tempfile::tempdir().unwrap();
    touch(&tmp.path().join("todos.rs"));
    touch(&tmp.path().join("todos/[id].rs"));
    touch(&tmp.path().join("users/index.rs"));

    let config = Config::default();
    let roots = vec![DiscoveryRoot::pages_api(tmp.path(), "/api")];
    let report = discovery::discover(&roots, &config).unwrap();

    let paths: Vec<&str> = report.routes.iter().map(|r| r.url_path.as_str()).collect();
    assert_eq!(paths, vec!["/api/todos", "/api/todos/{id}", "/api/users"]);
}

#[test]
fn test_missing_root_is_an_error() {
    let config = Config::default();
    let roots = vec![DiscoveryRoot::app_dir("/definitely/not/a/real/dir")];
    assert!(discovery::discover(&roots, &config).is_err());
}

#[test]
fn test_allow_list_narrows_inclusion() {
    let tmp = tempfile::tempdir().unwrap();
    touch(&tmp.path().join("api/todos/route.rs"));
    touch(&tmp.path().join("api/users/route.rs"));

    let mut config = Config::default();
    config.allowed_paths = vec!["/api/todos".to_string()];
    let roots = vec![DiscoveryRoot::app_dir(tmp.path())];
    let report = discovery::discover(&roots, &config).unwrap();

    assert_eq!(report.routes.len(), 1);
    assert_eq!(report.routes[0].url_path, "/api/todos");
    assert!(report
        .ignored
        .contains(&("/api/users".to_string(), IgnoreReason::Filtered)));
}
