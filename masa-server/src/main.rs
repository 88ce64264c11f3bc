//! masa-server — restaurant ordering core service
//!
//! Long-running service that:
//! - Prices carts from the menu catalog and persists orders
//! - Drives the order status state machine for the kitchen display
//! - Creates Stripe payment intents and reconciles confirmations
//! - Fans order events out to subscribed displays over WebSocket

use masa_server::api;
use masa_server::config::Config;
use masa_server::state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "masa_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting masa-server (env: {})", config.environment);

    // Initialize application state (pool, migrations, services)
    let state = AppState::new(&config).await?;

    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("masa-server HTTP listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}
