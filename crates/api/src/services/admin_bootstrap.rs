//! Creates the first administrator on startup.
//!
//! Runs after migrations. Does nothing when no bootstrap email is configured
//! or when an active admin already exists.

use domain::models::{PermissionMatrix, Role};
use persistence::repositories::{NewUser, UserRepository};
use shared::password::{check_strength, hash_password, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AdminBootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    NotConfigured,
    AdminExists,
    Created(Uuid),
}

pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    let email = config.bootstrap_email.trim();
    if email.is_empty() {
        return Ok(BootstrapOutcome::NotConfigured);
    }

    if config.bootstrap_password.is_empty() {
        warn!("SAW__ADMIN__BOOTSTRAP_EMAIL is set but SAW__ADMIN__BOOTSTRAP_PASSWORD is empty, skipping bootstrap");
        return Ok(BootstrapOutcome::NotConfigured);
    }

    let users = UserRepository::new(pool.clone());

    // nil never matches a real id, so this counts every active admin
    if users.count_other_active_admins(Uuid::nil()).await? > 0
        || users.find_by_email(email).await?.is_some()
    {
        info!("Admin user or bootstrap email already exists, skipping bootstrap");
        return Ok(BootstrapOutcome::AdminExists);
    }

    check_strength(&config.bootstrap_password)?;
    let password_hash = hash_password(&config.bootstrap_password)?;
    let full_name = if config.bootstrap_full_name.trim().is_empty() {
        "مدير النظام"
    } else {
        config.bootstrap_full_name.trim()
    };
    let permissions = PermissionMatrix::full().to_json();

    let user = users
        .create(NewUser {
            email,
            password_hash: &password_hash,
            full_name,
            role: Role::Admin,
            permissions: &permissions,
        })
        .await?;

    info!(email = %user.email, user_id = %user.id, "Bootstrap admin user created");
    warn!("SECURITY: remove SAW__ADMIN__BOOTSTRAP_PASSWORD from configuration after initial setup");

    Ok(BootstrapOutcome::Created(user.id))
}
