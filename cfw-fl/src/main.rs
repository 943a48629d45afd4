//! cfw-fl (Folder Lifecycle) - Course folder review workflow service
//!
//! Hosts the folder lifecycle state machine, edit permission evaluation,
//! reviewer feedback stores, and the autosave coordinator behind an HTTP
//! API with SSE event streaming.

use anyhow::Result;
use cfw_fl::{build_router, AppState};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cfw-fl", about = "CFW folder lifecycle service")]
struct Args {
    /// Root folder holding cfw.db (overrides CFW_ROOT_FOLDER and config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// HTTP port (overrides the http_port setting)
    #[arg(long)]
    port: Option<u16>,
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
    info!("Starting CFW Folder Lifecycle (cfw-fl) v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let root_folder =
        cfw_common::config::resolve_root_folder(args.root_folder.as_deref(), "CFW_ROOT_FOLDER");
    let db_path = cfw_common::config::prepare_root_folder(&root_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = cfw_common::db::init_database(&db_path).await?;

    let port = match args.port {
        Some(port) => port,
        None => cfw_fl::db::settings::load_http_port(&pool).await?,
    };

    let state = AppState::from_settings(pool).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("cfw-fl listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
