//! Timo - A focus timer service with persisted, drift-free state
//!
//! This is the main entry point for the timo application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use timo::{
    api::create_router,
    config::Config,
    services::check_command_available,
    state::{AppState, Collaborators},
    storage::FileStore,
    tasks::tick_driver_task,
    utils::{shutdown_signal, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timo={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timo server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, state_file={}, poll={}ms",
        config.host,
        config.port,
        config.state_file.display(),
        config.poll_interval_ms
    );

    // Completion commands are optional; a missing program only loses the side effect
    for command in [config.notify_command_line(), config.sound_command_line()]
        .into_iter()
        .flatten()
    {
        if let Err(e) = check_command_available(&command).await {
            warn!("{}", e);
        }
    }

    // Create application state from the persisted file
    let store = Arc::new(FileStore::new(&config.state_file));
    let collaborators = Collaborators {
        clock: Arc::new(SystemClock),
        notifier: config.notifier(),
        sound: config.sound_player(),
    };
    let state = Arc::new(AppState::new(store, collaborators));

    // Start the countdown polling background task
    let tick_state = Arc::clone(&state);
    let poll_interval = config.poll_interval();
    let tick_driver = tokio::spawn(async move {
        tick_driver_task(tick_state, poll_interval).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start       - Start or resume the timer");
    info!("  POST /pause       - Pause the timer");
    info!("  POST /toggle      - Start or pause");
    info!("  POST /reset       - Reset to the full duration");
    info!("  POST /increment   - Add one step to the duration");
    info!("  POST /decrement   - Remove one step from the duration");
    info!("  PUT  /duration    - Set the duration in minutes");
    info!("  PUT  /step        - Set the step (1, 5, 10, 15)");
    info!("  GET  /preferences - Read display preferences (PUT to update)");
    info!("  GET  /status      - Current timer status");
    info!("  GET  /health      - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Stop polling; the persisted target end time carries a running timer over
    tick_driver.abort();

    info!("Server shutdown complete");
    Ok(())
}
