use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use http::Method;
use sea_orm::Database;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    middleware::panic,
    migrations,
    providers::{
        firebase, DocumentStore, IdentityProvider, MemoryDocumentStore, MemoryIdentityProvider,
        PostgresDocumentStore, PostgresIdentityProvider,
    },
    routes::{api_routes, auth_routes},
    utils::{init_logger, load_config, BackendKind, CustomTokenSigner},
    AppConfig, AppState,
};

/// Command-line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "plateshare")]
#[command(author, version, about = "Registration and login service for restaurants, food banks and drivers.")]
pub struct CliArgs {
    /// Server bind address (overrides config file)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Server port (overrides config file)
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Identity and document backend (overrides config file)
    #[arg(short = 'B', long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Environment (development, staging, production)
    #[arg(short = 'E', long, default_value = "development")]
    pub env: String,

    /// Configuration file path
    #[arg(short = 'C', long, default_value = "config.toml")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    pub log_level: String,
}

/// Application bootstrap result containing all initialized components
pub struct BootstrapResult {
    pub app: Router,
    pub bind_addr: String,
}

/// Identity provider and document store selected by configuration
pub type Collaborators = (Arc<dyn IdentityProvider>, Arc<dyn DocumentStore>);

/// Initialize application logger
pub fn init_logging(log_level: &str) {
    init_logger(log_level);
}

/// Setup panic hook for graceful panic handling
pub fn setup_panic_handler() {
    panic::setup_panic_hook();
}

/// Load and merge configuration from file and CLI arguments
pub fn load_app_config(cli_args: &CliArgs) -> Result<AppConfig> {
    let mut app_config = load_config(&cli_args.config, &cli_args.env)
        .context("Failed to load application configuration")?;

    if let Some(host) = &cli_args.host {
        app_config.server.host = host.clone();
    }
    if let Some(port) = cli_args.port {
        app_config.server.port = port;
    }
    if let Some(backend) = cli_args.backend {
        app_config.backend = backend;
    }

    Ok(app_config)
}

/// Initialize database connection
pub async fn init_database(config: &AppConfig) -> Result<sea_orm::DatabaseConnection> {
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection established");
    Ok(db)
}

/// Run database migrations
pub async fn run_database_migrations(db: &sea_orm::DatabaseConnection) -> Result<()> {
    tracing::info!("Running database migrations...");
    migrations::run_migrations(db)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations completed");
    Ok(())
}

fn local_token_signer(config: &AppConfig) -> CustomTokenSigner {
    CustomTokenSigner::hs256(&config.jwt_issuer, &config.jwt_secret, config.jwt_expiry_seconds)
}

/// Build the identity provider and document store for the configured backend
pub async fn init_collaborators(config: &AppConfig) -> Result<Collaborators> {
    tracing::info!("Initializing {:?} backend", config.backend);

    let collaborators: Collaborators = match config.backend {
        BackendKind::Memory => {
            tracing::warn!("Memory backend selected; accounts and documents are lost on shutdown");
            (
                Arc::new(MemoryIdentityProvider::new(local_token_signer(config))),
                Arc::new(MemoryDocumentStore::new()),
            )
        }
        BackendKind::Postgres => {
            let db = init_database(config).await?;
            run_database_migrations(&db).await?;
            (
                Arc::new(PostgresIdentityProvider::new(db.clone(), local_token_signer(config))),
                Arc::new(PostgresDocumentStore::new(db)),
            )
        }
        BackendKind::Firebase => {
            let (identity, store) = firebase::connect(&config.firebase)
                .context("Failed to initialize managed identity backend")?;
            (Arc::new(identity), Arc::new(store))
        }
    };

    Ok(collaborators)
}

/// Create shared application state
pub fn create_app_state(
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    config: AppConfig,
) -> AppState {
    AppState {
        identity,
        store,
        config: Arc::new(config),
    }
}

/// Configure CORS layer
pub fn configure_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Build application router with all middleware
pub fn build_app_router(state: AppState) -> Router {
    Router::new()
        .merge(auth_routes())
        .merge(api_routes())
        .layer(CatchPanicLayer::custom(panic::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(configure_cors())
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Bootstrap the entire application
pub async fn bootstrap(cli_args: CliArgs) -> Result<BootstrapResult> {
    tracing::info!("Starting plateshare in {} mode", cli_args.env);

    let app_config = load_app_config(&cli_args)?;
    let bind_addr = format!("{}:{}", app_config.server.host, app_config.server.port);

    let (identity, store) = init_collaborators(&app_config).await?;
    let state = create_app_state(identity, store, app_config);
    let app = build_app_router(state);

    Ok(BootstrapResult { app, bind_addr })
}

/// Start HTTP server with graceful shutdown
pub async fn start_server(bootstrap_result: BootstrapResult) -> Result<()> {
    let BootstrapResult { app, bind_addr } = bootstrap_result;

    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("Server is ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    tracing::info!("Server shutdown completed");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        tracing::info!("Received Ctrl+C signal, initiating graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        tracing::info!("Received SIGTERM signal, initiating graceful shutdown");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli_args = CliArgs::parse_from([
            "plateshare",
            "--config",
            "does-not-exist.toml",
            "--port",
            "8088",
            "--backend",
            "memory",
        ]);

        let config = load_app_config(&cli_args).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.backend, BackendKind::Memory);
    }

    #[tokio::test]
    async fn test_memory_collaborators() {
        let config = AppConfig {
            backend: BackendKind::Memory,
            ..AppConfig::default()
        };

        let (identity, _store) = init_collaborators(&config).await.unwrap();
        let created = identity.create_user("a@b.com", "secret1").await.unwrap();
        assert_eq!(identity.get_user_by_email("a@b.com").await.unwrap(), created);
    }
}
