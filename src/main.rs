use mada_ride::clock::SystemClock;
use mada_ride::{api, config, state};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Registry, fmt, reload};

type LevelHandle = reload::Handle<LevelFilter, Registry>;

/// Install the subscriber at `info`; the configured level is applied once
/// the config has been read, so config failures are still logged.
fn init_tracing() -> LevelHandle {
    let (filter, handle) = reload::Layer::new(LevelFilter::INFO);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
    handle
}

fn apply_log_level(handle: &LevelHandle, level: &str) {
    match level.parse::<LevelFilter>() {
        Ok(filter) => {
            if let Err(err) = handle.reload(filter) {
                tracing::warn!(error = %err, "Failed to apply log level");
            }
        }
        Err(_) => tracing::warn!(level, "Unknown log level, using info"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let level_handle = init_tracing();
    let config = match config::load_default() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(
                config_path = config::DEFAULT_CONFIG_PATH,
                error = %err,
                "Failed to load config"
            );
            return Err(err.into());
        }
    };
    apply_log_level(&level_handle, &config.logging.level);
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "mada-ride starting"
    );

    let settings = config.settings()?;
    tracing::info!(
        initial_fee = settings.fare.initial_fee,
        free_minutes = settings.fare.free_minutes,
        per_minute_rate = settings.fare.per_minute_rate,
        policy = ?settings.transition_policy,
        "Settings resolved"
    );
    let state = Arc::new(RwLock::new(state::AppState::new(
        settings,
        Arc::new(SystemClock),
    )));

    let app = api::router(Arc::clone(&state));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
