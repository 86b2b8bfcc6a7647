pub mod bootstrap;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod providers;
pub mod routes;
pub mod services;
pub mod utils;

use providers::{DocumentStore, IdentityProvider};
use std::sync::Arc;
pub use utils::AppConfig;

/// Application shared state
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
}
