//! Student Portal Forms API server
//!
//! # Usage
//!
//! ```bash
//! portal-api --bind 0.0.0.0:8080
//! PORTAL_BIND=127.0.0.1:9000 RUST_LOG=portal_forms=debug portal-api
//! ```

use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use portal_api::{build_router, ApiState};

#[derive(Parser)]
#[command(name = "portal-api")]
#[command(version, about = "Student Portal Forms API", long_about = None)]
struct Cli {
    /// Socket address to listen on
    #[arg(long, env = "PORTAL_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(cli.bind).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(bind: SocketAddr) -> std::io::Result<()> {
    let app = build_router(ApiState::in_memory());
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, "portal forms API listening");
    axum::serve(listener, app).await
}
