pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod websocket;
pub mod ws;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use config::Config;
use routes::cors::CorsPolicy;
use ws::hub::RoomHub;

/// Shared by every request and socket task.
pub struct AppState {
    pub hub: Mutex<RoomHub>,
    pub cors: CorsPolicy,
    pub config: Config,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            hub: Mutex::new(RoomHub::new(config.default_language.clone())),
            cors: CorsPolicy::from_config(&config),
            config,
            started_at: Utc::now(),
        }
    }
}

pub use routes::create_router;
