pub mod api;
pub mod auth;

pub use api::api_routes;
pub use auth::auth_routes;
