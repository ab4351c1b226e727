//! Activity log listing.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::activity_log::ListActivityLogsQuery;
use domain::models::{ActivityLog, PageRequest, Paginated, PermissionAction, PermissionSection};
use persistence::repositories::ActivityLogRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// Newest entries first.
///
/// GET /api/v1/activity-logs
pub async fn list_activity_logs(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListActivityLogsQuery>,
) -> Result<Json<Paginated<ActivityLog>>, ApiError> {
    current.require(PermissionSection::ActivityLogs, PermissionAction::View)?;

    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(ApiError::validation("تاريخ البداية يجب أن يسبق تاريخ النهاية"));
        }
    }

    let page = PageRequest::new(query.page, query.per_page);
    let (entries, total) = ActivityLogRepository::new(state.pool.clone())
        .list(&query)
        .await?;

    Ok(Json(Paginated::new(entries, page, total)))
}
