//! # CLI Module
//!
//! Command-line entry points for spec generation and CI validation.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Discover routes, probe them, and write the OpenAPI document:
//!
//! ```bash
//! my-service generate --app-dir app --output public
//! ```
//!
//! ### `validate`
//!
//! Check that the persisted document matches the code without writing
//! anything. Exits non-zero when the document is stale, which makes it
//! suitable as a CI gate:
//!
//! ```bash
//! my-service validate --app-dir app --output public
//! ```
//!
//! ## Usage from Code
//!
//! The CLI is a library entry so every service embeds it against its own
//! route registry:
//!
//! ```rust,ignore
//! use clap::Parser;
//! use restframe::cli::{run_cli, Cli};
//! use restframe::registry::RouteRegistry;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(build_registry());
//! let cli = Cli::parse();
//! std::process::exit(run_cli(cli, registry)?);
//! ```

mod commands;

pub use commands::{init_tracing, run_cli, Cli, Commands};
