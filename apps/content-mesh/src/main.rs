//! # content-mesh
//!
//! Command-line front end for the content-mesh graph engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │               apps/content-mesh (THE BINARY)             │
//! │                                                          │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐   │
//! │  │    CLI      │    │   Config    │    │  Snapshot   │   │
//! │  │   (clap)    │    │   (toml)    │    │ (serde_json)│   │
//! │  └──────┬──────┘    └──────┬──────┘    └──────┬──────┘   │
//! │         └──────────────────┼──────────────────┘          │
//! │                            ▼                             │
//! │                 ┌────────────────────┐                   │
//! │                 │ content-mesh-core  │                   │
//! │                 │    (THE LOGIC)     │                   │
//! │                 └────────────────────┘                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! content-mesh -i export.json summary
//! content-mesh -i export.json node --collection posts --key 1
//! content-mesh -i export.json --config mesh.toml export -o graph.json
//! content-mesh -i export.json check
//! ```

use clap::Parser;
use content_mesh::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // CONTENT_MESH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CONTENT_MESH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "content_mesh=debug"
    } else {
        "content_mesh=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
