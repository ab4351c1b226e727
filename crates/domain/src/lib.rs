//! Domain layer for the SAW Tracker backend.
//!
//! - Models for companies, employees, projects, users and settings
//! - The expiry classifier and alert generation
//! - Threshold cache, fuzzy search and activity-log building

pub mod models;
pub mod services;
