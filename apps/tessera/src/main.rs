//! # Tessera
//!
//! The binary for the Tessera configuration and incremental-state engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  apps/tessera (THE BINARY)               │
//! │                                                          │
//! │  ┌─────────────┐   ┌─────────────┐   ┌───────────────┐   │
//! │  │    CLI      │──▶│   Script    │──▶│    Replay     │   │
//! │  │   (clap)    │   │ (serde/toml)│   │ (editor exts) │   │
//! │  └─────────────┘   └─────────────┘   └───────┬───────┘   │
//! │                                              ▼           │
//! │                                      ┌───────────────┐   │
//! │                                      │ tessera-core  │   │
//! │                                      │ (THE ENGINE)  │   │
//! │                                      └───────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! tessera replay -s session.toml
//! tessera inspect -s session.toml --json-mode
//! tessera check -s session.toml
//! ```

use clap::Parser;
use tessera::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // TESSERA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("TESSERA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tessera=info,tessera_core=info".into());

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

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Tessera startup banner.
fn print_banner() {
    println!(
        r#"
  ▀█▀ █▀▀ █▀ █▀ █▀▀ █▀█ ▄▀█
   █  ██▄ ▄█ ▄█ ██▄ █▀▄ █▀█

  Incremental editor state v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
