//! API monitoring proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ /api/proxy/{*endpoint}
//!                         │                  │
//!                         │                  ▼
//!                         │           ┌──────────────┐        ┌──────────┐
//!                         │           │   monitor    │───────▶│ upstream │
//!                         │           │   pipeline   │◀───────│ service  │
//!                         │           └──────┬───────┘        └──────────┘
//!                         │                  │ request + problem records
//!                         ▼                  ▼
//!              /api/requests ──────▶ ┌──────────────┐
//!              /api/problems ──────▶ │   storage    │
//!                                    │   (SQLite)   │
//!                                    └──────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "api-monitor", version, about = "API monitoring proxy")]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    api_monitor::lifecycle::startup::run(args.config.as_deref()).await?;
    Ok(())
}
