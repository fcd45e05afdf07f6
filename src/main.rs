use anyhow::Context;
use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use annual_yield::config::AppConfig;
use annual_yield::routes::{self, AppState};
use annual_yield::services::indices::builtin_indices;
use annual_yield::services::profile::{ProfileFetcher, RelayPageSource};
use annual_yield::services::session::Session;
use annual_yield::services::storage::FileBlobStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = AppConfig::from_env();
    info!("Using PORT: {}, state dir: {}", config.port, config.data_dir);

    let indices = builtin_indices()
        .map_err(|e| anyhow::anyhow!(e))
        .context("loading built-in index data")?;
    let backend = FileBlobStore::new(&config.data_dir)
        .with_context(|| format!("opening state dir {}", config.data_dir))?;
    let session = Session::start(Box::new(backend), indices);

    let source = RelayPageSource::new(config.relay_url.clone(), config.profile_url.clone())
        .context("building HTTP client")?;
    let fetcher = ProfileFetcher::new(Arc::new(source), config.retry);
    let state = Arc::new(AppState::new(session, fetcher));

    // Bind to 0.0.0.0 for container hosts
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
