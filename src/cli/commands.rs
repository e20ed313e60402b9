use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::discovery::{self, DiscoveryRoot};
use crate::engine::{Environment, ValidationEngine};
use crate::registry::RouteRegistry;
use crate::sync::{InProcessProbe, SpecSync, SyncOutcome};
use crate::telemetry::WarnLedger;

/// Command-line interface for spec synchronization.
#[derive(Parser)]
#[command(name = "restframe")]
#[command(about = "OpenAPI spec generation and validation", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by both subcommands.
#[derive(Args)]
pub struct SyncArgs {
    /// Path to a JSON configuration file; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// App-directory style root to scan (repeatable)
    #[arg(long, default_values_os_t = vec![PathBuf::from("app")])]
    pub app_dir: Vec<PathBuf>,

    /// Pages-style API root to scan, mounted under /api (repeatable)
    #[arg(long)]
    pub pages_dir: Vec<PathBuf>,

    /// Directory the document file is written under
    #[arg(short, long, default_value = "public")]
    pub output: PathBuf,

    /// Per-pass introspection deadline in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Verbose logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Regenerate the OpenAPI document from the registered routes
    Generate(SyncArgs),
    /// Check the persisted document against the code; exits 1 when stale
    Validate(SyncArgs),
}

/// Initialize structured logging for a CLI invocation. `RUST_LOG` wins over
/// the debug flag when set.
pub fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run one CLI invocation against the caller's route registry and return the
/// process exit code.
pub fn run_cli(cli: Cli, registry: Arc<RouteRegistry>) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Generate(args) => {
            init_tracing(args.debug);
            run_sync(&args, registry, false)?;
            Ok(0)
        }
        Commands::Validate(args) => {
            init_tracing(args.debug);
            match run_sync(&args, registry, true)? {
                SyncOutcome::Stale => Ok(1),
                _ => Ok(0),
            }
        }
    }
}

fn run_sync(
    args: &SyncArgs,
    registry: Arc<RouteRegistry>,
    validate_only: bool,
) -> anyhow::Result<SyncOutcome> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let mut roots: Vec<DiscoveryRoot> = args
        .app_dir
        .iter()
        .map(DiscoveryRoot::app_dir)
        .collect();
    roots.extend(args.pages_dir.iter().map(|dir| DiscoveryRoot::pages_api(dir, "/api")));

    let report = discovery::discover_and_report(&roots, &config)?;

    let ledger = Arc::new(WarnLedger::new());
    let engine = Arc::new(ValidationEngine::new(
        Environment::Development,
        Arc::clone(&ledger),
    ));
    let probe = Arc::new(InProcessProbe::new(engine, registry));
    let file = args
        .output
        .join(config.openapi_json_path.trim_start_matches('/'));
    let sync = SpecSync::new(config, probe, Duration::from_millis(args.timeout_ms));

    let outcome = if validate_only {
        sync.validate_file(&report.routes, &file)?
    } else {
        sync.sync_to_file(&report.routes, &file)?
    };

    let degraded = ledger.degraded();
    if !degraded.is_empty() {
        warn!(
            count = degraded.len(),
            "generated document contains degraded (unconstrained) schemas"
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from(["restframe", "generate"]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.app_dir, vec![PathBuf::from("app")]);
                assert_eq!(args.output, PathBuf::from("public"));
                assert_eq!(args.timeout_ms, 10_000);
                assert!(!args.debug);
            }
            Commands::Validate(_) => panic!("expected generate"),
        }
    }

    #[test]
    fn test_validate_accepts_overrides() {
        let cli = Cli::parse_from([
            "restframe",
            "validate",
            "--app-dir",
            "src/app",
            "--pages-dir",
            "pages/api",
            "--output",
            "generated",
            "--timeout-ms",
            "500",
        ]);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.app_dir, vec![PathBuf::from("src/app")]);
                assert_eq!(args.pages_dir, vec![PathBuf::from("pages/api")]);
                assert_eq!(args.output, PathBuf::from("generated"));
                assert_eq!(args.timeout_ms, 500);
            }
            Commands::Generate(_) => panic!("expected validate"),
        }
    }
}
