//! # Configuration Module
//!
//! Aggregation and docs configuration. Callers normally supply a partial
//! configuration (from a JSON file or built in code) and every omitted field
//! falls back to a documented default, so an empty configuration is a valid
//! one.
//!
//! ## Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `allowedPaths` | `["**"]` (everything) |
//! | `deniedPaths` | `[]` (nothing) |
//! | `openApiJsonPath` | `/openapi.json` |
//! | `docsPath` | `/api/docs` |
//! | `autoGenerateSpec` | `true` |
//! | `suppressInfo` | `false` |
//!
//! Path filters use the glob syntax from [`crate::discovery`]: `*` matches
//! one path segment, `**` matches any number.

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Which documentation UI the docs endpoint embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocsProvider {
    Redoc,
    SwaggerUi,
}

/// Presentation settings for the rendered docs page.
#[derive(Debug, Clone, PartialEq)]
pub struct DocsConfig {
    pub provider: DocsProvider,
    pub title: String,
    pub description: String,
    pub favicon_url: Option<String>,
    pub logo_url: Option<String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            provider: DocsProvider::Redoc,
            title: "API Reference".to_string(),
            description: String::new(),
            favicon_url: None,
            logo_url: None,
        }
    }
}

/// Fully resolved configuration. Construct via [`Config::default`] or by
/// merging a [`PartialConfig`] with [`PartialConfig::into_config`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Glob patterns a route must match to be aggregated.
    pub allowed_paths: Vec<String>,
    /// Glob patterns that exclude a route even when allowed.
    pub denied_paths: Vec<String>,
    /// Where the generated document is persisted and served.
    pub openapi_json_path: String,
    /// Where the docs UI is mounted.
    pub docs_path: String,
    /// Whether the synchronizer regenerates the document on startup.
    pub auto_generate_spec: bool,
    /// Deep-merged over the assembled document as the final step, so callers
    /// can set `info`, `servers`, security schemes and anything else the
    /// aggregator does not produce.
    pub spec_overrides: Option<Value>,
    pub docs: DocsConfig,
    /// Silence the informational regeneration logs. Warnings still fire.
    pub suppress_info: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allowed_paths: vec!["**".to_string()],
            denied_paths: Vec::new(),
            openapi_json_path: "/openapi.json".to_string(),
            docs_path: "/api/docs".to_string(),
            auto_generate_spec: true,
            spec_overrides: None,
            docs: DocsConfig::default(),
            suppress_info: false,
        }
    }
}

impl Config {
    /// Paths that must never be aggregated as routes: the document and docs
    /// endpoints themselves, plus the YAML twin of the JSON path.
    pub fn reserved_paths(&self) -> Vec<String> {
        vec![
            self.openapi_json_path.clone(),
            self.openapi_yaml_path(),
            self.docs_path.clone(),
        ]
    }

    /// The YAML variant is always served next to the JSON document.
    pub fn openapi_yaml_path(&self) -> String {
        match self.openapi_json_path.strip_suffix(".json") {
            Some(base) => format!("{base}.yaml"),
            None => format!("{}.yaml", self.openapi_json_path),
        }
    }

    /// Load and resolve a configuration file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let partial: PartialConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(partial.into_config())
    }
}

/// Deserialized shape of a user-supplied configuration: every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialConfig {
    pub allowed_paths: Option<Vec<String>>,
    pub denied_paths: Option<Vec<String>>,
    pub open_api_json_path: Option<String>,
    pub docs_path: Option<String>,
    pub auto_generate_spec: Option<bool>,
    pub spec_overrides: Option<Value>,
    pub docs: Option<PartialDocsConfig>,
    pub suppress_info: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialDocsConfig {
    pub provider: Option<DocsProvider>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub logo_url: Option<String>,
}

impl PartialConfig {
    /// Resolve against the defaults.
    pub fn into_config(self) -> Config {
        let defaults = Config::default();
        let docs_defaults = defaults.docs.clone();
        let docs = match self.docs {
            Some(partial) => DocsConfig {
                provider: partial.provider.unwrap_or(docs_defaults.provider),
                title: partial.title.unwrap_or(docs_defaults.title),
                description: partial.description.unwrap_or(docs_defaults.description),
                favicon_url: partial.favicon_url.or(docs_defaults.favicon_url),
                logo_url: partial.logo_url.or(docs_defaults.logo_url),
            },
            None => docs_defaults,
        };
        Config {
            allowed_paths: self.allowed_paths.unwrap_or(defaults.allowed_paths),
            denied_paths: self.denied_paths.unwrap_or(defaults.denied_paths),
            openapi_json_path: self
                .open_api_json_path
                .unwrap_or(defaults.openapi_json_path),
            docs_path: self.docs_path.unwrap_or(defaults.docs_path),
            auto_generate_spec: self
                .auto_generate_spec
                .unwrap_or(defaults.auto_generate_spec),
            spec_overrides: self.spec_overrides,
            docs,
            suppress_info: self.suppress_info.unwrap_or(defaults.suppress_info),
        }
    }
}

/// Tracks the last applied configuration so a regeneration pass can react to
/// changes instead of diffing on every request.
#[derive(Debug, Default)]
pub struct ConfigWatch {
    current: Mutex<Option<Config>>,
}

impl ConfigWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `config` as current and report whether it differs from the
    /// previously recorded one. The first observation always counts as a
    /// change.
    pub fn changed(&self, config: &Config) -> bool {
        let mut guard = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let changed = guard.as_ref() != Some(config);
        if changed {
            if guard.is_some() && !config.suppress_info {
                info!("configuration changed, spec regeneration scheduled");
            }
            *guard = Some(config.clone());
        }
        changed
    }
}
