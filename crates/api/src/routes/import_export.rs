//! Spreadsheet import/export and JSON bulk import routes.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use domain::models::import::{
    BulkCompanyImportRequest, BulkEmployeeImportRequest, ImportOptions, ImportSummary,
};
use domain::models::{ActivityAction, EntityType, PermissionAction, PermissionSection};
use persistence::repositories::{
    ActivityLogRepository, CompanyListFilter, CompanyRepository, EmployeeRepository,
};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::middleware::record_export;
use crate::services::excel::{
    self, EmployeeRow, SheetKind, XLSX_CONTENT_TYPE,
};
use crate::services::ImportService;

fn xlsx_response(filename: String, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
}

fn require_body(body: &Bytes) -> Result<(), ApiError> {
    if body.is_empty() {
        return Err(ApiError::validation("لم يتم إرفاق ملف"));
    }
    Ok(())
}

fn log_import(
    state: &AppState,
    current: &CurrentUser,
    entity_type: EntityType,
    source: &str,
    summary: &ImportSummary,
) {
    if summary.dry_run {
        return;
    }
    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Import, entity_type)
            .with_detail("source", source)
            .with_detail("processed", summary.processed)
            .with_detail("created", summary.created)
            .with_detail("updated", summary.updated)
            .with_detail("skipped", summary.skipped)
            .with_detail("failed", summary.errors.len())
            .build(),
    );
    info!(
        user_id = %current.id,
        entity_type = entity_type.as_str(),
        processed = summary.processed,
        created = summary.created,
        updated = summary.updated,
        failed = summary.errors.len(),
        "Import finished"
    );
}

/// Upload an .xlsx workbook of employees. The first sheet is read.
///
/// POST /api/v1/import/employees?dry_run=&update_existing=
pub async fn import_employees_xlsx(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(options): Query<ImportOptions>,
    body: Bytes,
) -> Result<Json<ImportSummary>, ApiError> {
    current.require(PermissionSection::ImportExport, PermissionAction::Import)?;
    require_body(&body)?;

    let sheet = excel::read_first_sheet(&body)?;
    let rows = excel::parse_employee_rows(&sheet, state.config.import.max_rows)?;
    let summary = ImportService::new(state.pool.clone())
        .import_employees(rows, options)
        .await?;

    log_import(&state, &current, EntityType::Employee, "xlsx", &summary);
    Ok(Json(summary))
}

/// POST /api/v1/import/companies?dry_run=&update_existing=
pub async fn import_companies_xlsx(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(options): Query<ImportOptions>,
    body: Bytes,
) -> Result<Json<ImportSummary>, ApiError> {
    current.require(PermissionSection::ImportExport, PermissionAction::Import)?;
    require_body(&body)?;

    let sheet = excel::read_first_sheet(&body)?;
    let rows = excel::parse_company_rows(&sheet, state.config.import.max_rows)?;
    let summary = ImportService::new(state.pool.clone())
        .import_companies(rows, options)
        .await?;

    log_import(&state, &current, EntityType::Company, "xlsx", &summary);
    Ok(Json(summary))
}

/// Empty workbook with the import header row.
///
/// GET /api/v1/import/template/:kind
pub async fn download_template(
    current: CurrentUser,
    Path(kind): Path<SheetKind>,
) -> Result<impl IntoResponse, ApiError> {
    current.require(PermissionSection::ImportExport, PermissionAction::Import)?;
    let bytes = excel::import_template(kind)?;
    Ok(xlsx_response(format!("{}-template.xlsx", kind.as_str()), bytes))
}

/// Employees as JSON; `company_id` is used as given.
///
/// POST /api/v1/employees/bulk
pub async fn bulk_import_employees(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<BulkEmployeeImportRequest>,
) -> Result<Json<ImportSummary>, ApiError> {
    current.require(PermissionSection::ImportExport, PermissionAction::Import)?;
    request.validate()?;

    let rows = request
        .employees
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            (
                i + 1,
                Ok(EmployeeRow {
                    input,
                    company_name: None,
                }),
            )
        })
        .collect();
    let summary = ImportService::new(state.pool.clone())
        .import_employees(rows, request.options)
        .await?;

    log_import(&state, &current, EntityType::Employee, "json", &summary);
    Ok(Json(summary))
}

/// POST /api/v1/companies/bulk
pub async fn bulk_import_companies(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<BulkCompanyImportRequest>,
) -> Result<Json<ImportSummary>, ApiError> {
    current.require(PermissionSection::ImportExport, PermissionAction::Import)?;
    request.validate()?;

    let rows = request
        .companies
        .into_iter()
        .enumerate()
        .map(|(i, input)| (i + 1, Ok(input)))
        .collect();
    let summary = ImportService::new(state.pool.clone())
        .import_companies(rows, request.options)
        .await?;

    log_import(&state, &current, EntityType::Company, "json", &summary);
    Ok(Json(summary))
}

/// GET /api/v1/export/employees
pub async fn export_employees(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    current.require(PermissionSection::ImportExport, PermissionAction::Export)?;

    let employees = EmployeeRepository::new(state.pool.clone())
        .list_all_with_company_name()
        .await?;
    let thresholds = state.thresholds.get().await?;
    let today = state.today();
    let bytes = excel::export_employees(&employees, &thresholds, today)?;

    record_export(SheetKind::Employees.as_str(), employees.len());
    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Export, EntityType::Employee)
            .with_detail("rows", employees.len())
            .build(),
    );

    Ok(xlsx_response(format!("employees-{}.xlsx", today), bytes))
}

/// GET /api/v1/export/companies
pub async fn export_companies(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    current.require(PermissionSection::ImportExport, PermissionAction::Export)?;

    let (companies, _) = CompanyRepository::new(state.pool.clone())
        .list(&CompanyListFilter::default(), None)
        .await?;
    let thresholds = state.thresholds.get().await?;
    let today = state.today();
    let bytes = excel::export_companies(&companies, &thresholds, today)?;

    record_export(SheetKind::Companies.as_str(), companies.len());
    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Export, EntityType::Company)
            .with_detail("rows", companies.len())
            .build(),
    );

    Ok(xlsx_response(format!("companies-{}.xlsx", today), bytes))
}
