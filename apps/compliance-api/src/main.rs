//! Compliance API Server - HTTP boundary for the geo-compliance engine
//!
//! Provides REST endpoints for:
//! - Single and batch feature analysis
//! - Dashboard aggregates over the audit log
//! - CSV export of recorded verdicts
//! - Knowledge base inspection

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use compliance_engine::EngineConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod audit_store;
mod error;
mod handlers;
mod models;
mod state;

use state::AppState;

/// Command-line arguments for the compliance API
#[derive(Parser, Debug)]
#[command(name = "compliance-api")]
#[command(about = "Geo-compliance analysis API")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// SQLite database holding the audit log
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:compliance.db?mode=rwc")]
    database_url: String,

    /// TOML engine configuration; environment variables are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Analysis
        .route("/api/mode", get(handlers::mode))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/analyze/batch", post(handlers::analyze_batch))
        // Reporting
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/export.csv", get(handlers::export_csv))
        .route("/api/regulations", get(handlers::regulations))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let engine_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("compliance_api={engine_level}").parse()?)
                .add_directive(format!("compliance_engine={engine_level}").parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::from_env()?,
    };

    info!("Initializing compliance API...");
    let state = Arc::new(AppState::new(&args.database_url, &config).await?);
    info!(mode = %state.engine.mode(), "Reasoning mode");

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting compliance API on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
