//! lorehall-web - community knowledge-archive web application
//!
//! Serves the archive UI: event pages, entries, tags, user settings, and
//! advanced search.

use anyhow::Result;
use clap::Parser;
use lorehall_common::config;
use lorehall_common::db::init_database;
use lorehall_web::{build_router, AppState};
use tracing::info;

/// Command-line options
#[derive(Debug, Parser)]
#[command(name = "lorehall-web", about = "Community knowledge-archive web application")]
struct Args {
    /// Root data folder (overrides LOREHALL_ROOT and the config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// Port to listen on
    #[arg(long, default_value_t = 5740)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Lorehall (lorehall-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), "LOREHALL_ROOT")?;
    std::fs::create_dir_all(&root_folder)?;

    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("✓ Database ready");

    // Create application state and router
    let state = AppState::new(pool);
    let app = build_router(state);

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("lorehall-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
