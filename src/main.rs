// src/main.rs - Print queue HTTP server
use clap::Parser;
use print_queue::config;
use print_queue::{PrintQueue, web};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "print-queue", version, about = "In-memory PDF print queue")]
struct Args {
    /// Path to a TOML configuration file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<String>,
    /// Listen address, overrides `server.bind`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    let loaded = args.config.as_deref().map(config::load_config).transpose();

    // Initialize logging before reporting config errors
    let level = match &loaded {
        Ok(Some(config)) => {
            tracing::Level::from_str(&config.server.log_level).unwrap_or(tracing::Level::INFO)
        }
        _ => tracing::Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = match loaded {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            tracing::error!(
                "Failed to load config from '{}': {}",
                args.config.as_deref().unwrap_or_default(),
                e
            );
            return Err(e.into());
        }
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    tracing::info!("Starting print queue");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match &args.config {
        Some(path) => tracing::info!("Configuration loaded from: {}", path),
        None => tracing::info!("No configuration file given, using defaults"),
    }
    tracing::info!("Page delay: {} ms", config.queue.print_delay_ms);
    tracing::info!("Max file size: {} bytes", config.queue.max_file_size);
    tracing::info!(
        "Accepted content types: {}",
        config.queue.accepted_content_types.join(", ")
    );

    let queue = Arc::new(PrintQueue::new(config.queue.clone()));
    let app = web::api::create_router(queue);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("Web API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Print queue stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
