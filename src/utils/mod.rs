pub mod config;
pub mod error;
pub mod logger;
pub mod password;
pub mod token;
pub mod validator;

pub use config::{load_config, AppConfig, BackendKind};
pub use error::ApiError;
pub use logger::init_logger;
pub use password::hash_password;
pub use token::CustomTokenSigner;
pub use validator::{normalize_email, validate_email, validate_password};
