//! Shared utilities for the SAW Tracker backend.
//!
//! - Password hashing with Argon2id
//! - JWT issue/verify
//! - Field validators for Saudi registry numbers
//! - Date parsing helpers used by import and the expiry classifier

pub mod dates;
pub mod jwt;
pub mod password;
pub mod validation;
