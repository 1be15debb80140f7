use codecollab_relay::{config::Config, create_router, AppState};
use tracing::{info, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use std::panic;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "codecollab_relay=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    if config.is_production() && config.cors_origins.is_none() {
        warn!("No CORS_ORIGINS configured - browsers will be refused");
    }
    if config.is_development() {
        warn!("Development mode - all origins are allowed");
    }

    let address = config.server_address();
    let service_name = config.service_name.clone();
    let app_state = Arc::new(AppState::new(config));
    let app_routes = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("🚀 {} running on http://{}", service_name, address);
    info!("📡 WebSocket available at ws://{}/ws", address);

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
