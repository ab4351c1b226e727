//! Application services used by the route handlers and jobs.

pub mod admin_bootstrap;
pub mod auth;
pub mod capacity;
pub mod digest;
pub mod email;
pub mod excel;
pub mod import;

pub use auth::AuthService;
pub use email::EmailService;
pub use import::ImportService;
