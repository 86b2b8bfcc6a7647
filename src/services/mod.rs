pub mod auth;

pub use auth::{AuthService, LoginResponse, RegistrationInput};
