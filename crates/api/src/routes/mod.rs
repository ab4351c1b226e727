//! HTTP route handlers.

pub mod activity_logs;
pub mod alerts;
pub mod auth;
pub mod companies;
pub mod dashboard;
pub mod employees;
pub mod health;
pub mod import_export;
pub mod projects;
pub mod search;
pub mod settings;
pub mod users;
