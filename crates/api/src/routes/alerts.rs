//! Expiry alert routes.
//!
//! Alerts are computed on every request from the current records and
//! thresholds; only the per-user read marks are stored.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::alert::ListAlertsQuery;
use domain::models::{AlertStats, ExpiryAlert, PermissionAction, PermissionSection};
use domain::services::alerts::{company_alerts, employee_alerts, mark_read as apply_read_marks, sort_alerts};
use persistence::repositories::{CompanyRepository, EmployeeRepository, ReadAlertRepository};
use serde::Serialize;
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// Every current alert, sorted, without read marks.
pub(crate) async fn compute_alerts(state: &AppState) -> Result<Vec<ExpiryAlert>, ApiError> {
    let thresholds = state.thresholds.get().await?;
    let employees = EmployeeRepository::new(state.pool.clone())
        .list_all_with_company_name()
        .await?;
    let companies = CompanyRepository::new(state.pool.clone()).list_all().await?;
    let today = state.today();

    let mut alerts = employee_alerts(&employees, &thresholds, today);
    alerts.extend(company_alerts(&companies, &thresholds, today));
    sort_alerts(&mut alerts);
    Ok(alerts)
}

async fn alerts_for_user(state: &AppState, current: &CurrentUser) -> Result<Vec<ExpiryAlert>, ApiError> {
    let mut alerts = compute_alerts(state).await?;
    let read_ids = ReadAlertRepository::new(state.pool.clone())
        .read_ids(current.id)
        .await?;
    apply_read_marks(&mut alerts, &read_ids);
    Ok(alerts)
}

#[derive(Debug, Serialize)]
pub struct AlertListResponse {
    pub data: Vec<ExpiryAlert>,
    pub stats: AlertStats,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked: u64,
}

/// GET /api/v1/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<AlertListResponse>, ApiError> {
    current.require(PermissionSection::Alerts, PermissionAction::View)?;

    let alerts = alerts_for_user(&state, &current).await?;
    let stats = AlertStats::from_alerts(&alerts);
    let data: Vec<ExpiryAlert> = alerts.into_iter().filter(|a| query.matches(a)).collect();
    debug!(user_id = %current.id, total = stats.total, returned = data.len(), "Listed alerts");

    Ok(Json(AlertListResponse { data, stats }))
}

/// GET /api/v1/alerts/stats
pub async fn alert_stats(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<AlertStats>, ApiError> {
    current.require(PermissionSection::Alerts, PermissionAction::View)?;
    let alerts = alerts_for_user(&state, &current).await?;
    Ok(Json(AlertStats::from_alerts(&alerts)))
}

/// POST /api/v1/alerts/:alert_id/read
pub async fn mark_read(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(alert_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    current.require(PermissionSection::Alerts, PermissionAction::View)?;
    ReadAlertRepository::new(state.pool.clone())
        .mark_read(current.id, &alert_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/alerts/:alert_id/read
pub async fn mark_unread(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(alert_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    current.require(PermissionSection::Alerts, PermissionAction::View)?;
    ReadAlertRepository::new(state.pool.clone())
        .mark_unread(current.id, &alert_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Marks every current alert read for the caller.
///
/// POST /api/v1/alerts/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    current.require(PermissionSection::Alerts, PermissionAction::View)?;

    let ids: Vec<String> = compute_alerts(&state)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();
    let marked = ReadAlertRepository::new(state.pool.clone())
        .mark_many_read(current.id, &ids)
        .await?;

    Ok(Json(MarkAllReadResponse { marked }))
}
