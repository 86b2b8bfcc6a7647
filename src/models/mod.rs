pub mod account;
pub mod document;
pub mod profile;

pub use profile::{Availability, Role, RoleRecord, UserProfile};
