use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use knit::config::{Cli, Config};
use knit::state::AppState;
use knit::{db, gateway_for, open_store, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    tracing::info!("Database: {}", config.db_path().display());

    // A broken store keeps the server up; data routes answer 503
    let store = open_store(&config);
    if cli.seed {
        match &store {
            Ok(pool) => {
                db::seed::seed_demo(pool)?;
            }
            Err(_) => tracing::warn!("Skipping --seed, the database is not available"),
        }
    }

    let state = AppState::new(gateway_for(store), config.clone());
    let app = routes::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
