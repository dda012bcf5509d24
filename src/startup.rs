use crate::components::{GoogleCalendarClient, GoogleOAuthClient};
use crate::config::{Config, HandoffMode};
use crate::error::{other_error, Error};
use crate::shutdown;
use crate::web::{self, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// How often expired sessions are swept
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => {
            debug!("Loaded configuration: {:?}", config);
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Build the Google clients and application state
pub fn build_state(config: Config) -> miette::Result<AppState> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| other_error(&format!("Failed to create HTTP client: {}", e)))?;

    let oauth = Arc::new(GoogleOAuthClient::new(client.clone(), &config));
    let calendar = Arc::new(GoogleCalendarClient::new(
        client,
        config.endpoints.calendar_api_url.clone(),
    ));

    Ok(AppState::new(config, oauth, calendar))
}

/// Bind the listener and serve until shutdown
pub async fn start_server(config: Config) -> miette::Result<()> {
    let addr = config.listen_addr();
    let handoff_mode = config.handoff_mode;
    let state = build_state(config)?;

    if handoff_mode == HandoffMode::Session {
        spawn_session_pruner(state.clone());
    }

    let app = web::app(state)?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(Error::Io)?;
    info!("Listening on {} (hand-off mode: {:?})", addr, handoff_mode);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await
        .map_err(Error::Io)?;

    info!("Server shut down");
    Ok(())
}

fn spawn_session_pruner(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = state.sessions.prune_expired().await;
            if removed > 0 {
                debug!("Pruned {} expired sessions", removed);
            }
        }
    });
}
