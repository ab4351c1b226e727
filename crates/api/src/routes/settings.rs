//! Expiry threshold and login lockout settings routes.

use axum::{extract::State, Json};
use domain::models::login_attempt::{LOCKOUT_DURATION_MINUTES_KEY, MAX_LOGIN_ATTEMPTS_KEY};
use domain::models::setting::{DocumentThresholds, UpdateThresholdsRequest};
use domain::models::{
    ActivityAction, EntityType, LoginPolicy, PermissionAction, PermissionSection,
};
use persistence::repositories::{ActivityLogRepository, SettingRepository};
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ValidationDetail};
use crate::extractors::CurrentUser;
use crate::services::AuthService;

/// Thresholds for every document type, defaults filled in.
///
/// GET /api/v1/settings/thresholds
pub async fn get_thresholds(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<DocumentThresholds>>, ApiError> {
    current.require(PermissionSection::Settings, PermissionAction::View)?;
    let settings = state.thresholds.get().await?;
    Ok(Json(settings.to_view()))
}

/// Updates the listed documents and drops the cached copy so the next
/// classification uses the new values.
///
/// PUT /api/v1/settings/thresholds
pub async fn update_thresholds(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<UpdateThresholdsRequest>,
) -> Result<Json<Vec<DocumentThresholds>>, ApiError> {
    current.require(PermissionSection::AdminSettings, PermissionAction::Edit)?;

    let current_settings = state.thresholds.get().await?;
    let next = request.apply_to(&current_settings).map_err(|errors| {
        let details: Vec<ValidationDetail> = errors
            .into_iter()
            .map(|(field, message)| ValidationDetail { field, message })
            .collect();
        let message = match details.as_slice() {
            [single] => single.message.clone(),
            _ => "قيم التنبيهات غير صالحة".to_string(),
        };
        ApiError::Validation { message, details }
    })?;

    state
        .thresholds
        .save(&next, Some(current.id))
        .await?
        .apply()
        .await;

    let changed: Vec<&str> = request
        .thresholds
        .iter()
        .map(|t| t.document.settings_prefix())
        .collect();
    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::SettingsUpdate, EntityType::Settings)
            .on_entity(domain::models::setting::NOTIFICATION_THRESHOLDS_KEY)
            .with_detail("documents", json!(changed))
            .with_detail("previous", current_settings.to_flat_json())
            .build(),
    );
    info!(user_id = %current.id, documents = ?changed, "Threshold settings updated");

    Ok(Json(next.to_view()))
}

/// Login lockout policy.
///
/// GET /api/v1/settings/security
pub async fn get_login_policy(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<LoginPolicy>, ApiError> {
    current.require(PermissionSection::Settings, PermissionAction::View)?;
    let policy = AuthService::new(state.pool.clone(), state.jwt.clone())
        .login_policy()
        .await?;
    Ok(Json(policy))
}

/// PUT /api/v1/settings/security
pub async fn update_login_policy(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(policy): Json<LoginPolicy>,
) -> Result<Json<LoginPolicy>, ApiError> {
    current.require(PermissionSection::AdminSettings, PermissionAction::Edit)?;
    policy.validate()?;

    let settings = SettingRepository::new(state.pool.clone());
    settings
        .upsert(MAX_LOGIN_ATTEMPTS_KEY, &json!(policy.max_login_attempts), Some(current.id))
        .await?;
    settings
        .upsert(
            LOCKOUT_DURATION_MINUTES_KEY,
            &json!(policy.lockout_duration_minutes),
            Some(current.id),
        )
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::SettingsUpdate, EntityType::Settings)
            .on_entity(MAX_LOGIN_ATTEMPTS_KEY)
            .with_detail("max_login_attempts", json!(policy.max_login_attempts))
            .with_detail("lockout_duration_minutes", json!(policy.lockout_duration_minutes))
            .build(),
    );
    info!(
        user_id = %current.id,
        max_login_attempts = policy.max_login_attempts,
        lockout_duration_minutes = policy.lockout_duration_minutes,
        "Login lockout policy updated"
    );

    Ok(Json(policy))
}
