//! # Thrive - Capital OS
//!
//! The main binary for Thrive.
//!
//! This application provides:
//! - CLI interface for the truth engine, wallets, plans and execution gating
//! - Interactive operator dashboard (no subcommand)
//! - Local HTTP API and HTML dashboard (axum-based)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      apps/thrive (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐   │
//! │  │   CLI       │    │   HTTP API  │    │   AI Advisor     │   │
//! │  │  (clap)     │    │   (axum)    │    │   (reqwest)      │   │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘   │
//! │         │                  │                    │              │
//! │         └──────────────────┼────────────────────┘              │
//! │                            ▼                                   │
//! │                    ┌───────────────┐                           │
//! │                    │  thrive-core  │                           │
//! │                    │ (THE LOGIC)   │                           │
//! │                    └───────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Truth engine
//! thrive truth --demo
//!
//! # Start the local HTTP server
//! thrive server --port 8080
//!
//! # Wallet and plans
//! thrive wallet init --keystore wallets.json --label main --passphrase ...
//! thrive plan create --action SWAP --from-asset ETH --to-asset USDC --amount 1 \
//!     --snapshot-id s1 --exposure ETH=2
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // THRIVE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("THRIVE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "thrive=info,tower_http=debug".into());

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

    let cli = thrive::cli::Cli::parse();

    if cli.wants_banner() {
        print_banner();
    }

    if let Err(e) = thrive::cli::execute(cli).await {
        tracing::debug!(error = %e, "Command failed");
        eprintln!("ERROR: {}", e);
        std::process::exit(2);
    }
}

/// Print the Thrive startup banner.
fn print_banner() {
    println!(
        r#"
  ████████╗██╗  ██╗██████╗ ██╗██╗   ██╗███████╗
  ╚══██╔══╝██║  ██║██╔══██╗██║██║   ██║██╔════╝
     ██║   ███████║██████╔╝██║██║   ██║█████╗
     ██║   ██╔══██║██╔══██╗██║╚██╗ ██╔╝██╔══╝
     ██║   ██║  ██║██║  ██║██║ ╚████╔╝ ███████╗
     ╚═╝   ╚═╝  ╚═╝╚═╝  ╚═╝╚═╝  ╚═══╝  ╚══════╝

  Capital OS v{}

  Truthful • Explainable • Gated
"#,
        env!("CARGO_PKG_VERSION")
    );
}
