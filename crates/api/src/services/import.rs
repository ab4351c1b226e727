//! Row-by-row import of employees and companies.
//!
//! Shared by spreadsheet uploads and JSON bulk requests. A failing row is
//! recorded in the summary and never aborts the batch.

use std::collections::HashMap;

use domain::models::import::{ImportOptions, ImportOutcome, ImportSummary};
use domain::models::{CompanyInput, EmployeeInput};
use persistence::repositories::{CompanyRepository, EmployeeRepository, ProjectRepository};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::record_import_rows;
use crate::services::capacity::{ensure_company_has_room, ensure_limit_covers_headcount};
use crate::services::excel::EmployeeRow;

/// A row ready for import, or the reason it could not be parsed.
pub type ParsedRow<T> = (usize, Result<T, String>);

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn row_error(err: impl Into<ApiError>) -> ImportOutcome {
    ImportOutcome::Failed(err.into().user_message())
}

#[derive(Clone)]
pub struct ImportService {
    employees: EmployeeRepository,
    companies: CompanyRepository,
    projects: ProjectRepository,
}

impl ImportService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            employees: EmployeeRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            projects: ProjectRepository::new(pool),
        }
    }

    /// Upserts employees keyed by residence number.
    pub async fn import_employees(
        &self,
        rows: Vec<ParsedRow<EmployeeRow>>,
        options: ImportOptions,
    ) -> Result<ImportSummary, ApiError> {
        let company_ids: HashMap<String, Uuid> = self
            .companies
            .list_all()
            .await?
            .into_iter()
            .map(|c| (name_key(&c.name), c.id))
            .collect();
        let project_ids: HashMap<String, Uuid> = self
            .projects
            .list_with_counts()
            .await?
            .into_iter()
            .map(|p| (name_key(&p.project.name), p.project.id))
            .collect();

        let mut summary = ImportSummary::new(options.dry_run);
        for (row, parsed) in rows {
            let (identifier, outcome) = match parsed {
                Ok(parsed) => {
                    let identifier = Some(parsed.input.residence_number.trim().to_string())
                        .filter(|s| !s.is_empty());
                    let outcome = self
                        .import_employee(parsed, &company_ids, &project_ids, options)
                        .await;
                    (identifier, outcome)
                }
                Err(error) => (None, ImportOutcome::Failed(error)),
            };
            if let ImportOutcome::Failed(error) = &outcome {
                debug!(row, error = %error, "Employee row rejected");
            }
            summary.record(row, identifier, outcome);
        }

        record_summary("employees", &summary);
        info!(
            processed = summary.processed,
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed(),
            dry_run = summary.dry_run,
            "Employee import finished"
        );
        Ok(summary)
    }

    async fn import_employee(
        &self,
        parsed: EmployeeRow,
        company_ids: &HashMap<String, Uuid>,
        project_ids: &HashMap<String, Uuid>,
        options: ImportOptions,
    ) -> ImportOutcome {
        let mut input: EmployeeInput = parsed.input.normalized();

        if let Some(name) = parsed.company_name {
            match company_ids.get(&name_key(&name)) {
                Some(id) => input.company_id = Some(*id),
                None => return ImportOutcome::Failed(format!("المؤسسة غير موجودة: {}", name)),
            }
        }
        if input.project_id.is_none() {
            input.project_id = input
                .project_name
                .as_deref()
                .and_then(|name| project_ids.get(&name_key(name)).copied());
        }

        if let Err(errors) = input.validate() {
            return row_error(errors);
        }

        let existing = match self
            .employees
            .find_by_residence_number(&input.residence_number)
            .await
        {
            Ok(existing) => existing,
            Err(e) => return row_error(e),
        };
        if existing.is_some() && !options.update_existing {
            return ImportOutcome::Skipped;
        }

        let current_company = existing.as_ref().and_then(|e| e.company_id);
        if let Err(e) = ensure_company_has_room(&self.companies, input.company_id, current_company).await {
            return row_error(e);
        }

        match (existing, options.dry_run) {
            (Some(_), true) => ImportOutcome::Updated,
            (None, true) => ImportOutcome::Created,
            (Some(employee), false) => match self.employees.update(employee.id, &input).await {
                Ok(_) => ImportOutcome::Updated,
                Err(e) => row_error(e),
            },
            (None, false) => match self.employees.create(&input).await {
                Ok(_) => ImportOutcome::Created,
                Err(e) => row_error(e),
            },
        }
    }

    /// Upserts companies keyed by unified number. Rows without one are
    /// always created.
    pub async fn import_companies(
        &self,
        rows: Vec<ParsedRow<CompanyInput>>,
        options: ImportOptions,
    ) -> Result<ImportSummary, ApiError> {
        let mut summary = ImportSummary::new(options.dry_run);
        for (row, parsed) in rows {
            let (identifier, outcome) = match parsed {
                Ok(input) => {
                    let input = input.normalized();
                    let identifier = input
                        .unified_number
                        .clone()
                        .or_else(|| Some(input.name.clone()).filter(|n| !n.is_empty()));
                    (identifier, self.import_company(input, options).await)
                }
                Err(error) => (None, ImportOutcome::Failed(error)),
            };
            summary.record(row, identifier, outcome);
        }

        record_summary("companies", &summary);
        info!(
            processed = summary.processed,
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed(),
            dry_run = summary.dry_run,
            "Company import finished"
        );
        Ok(summary)
    }

    async fn import_company(&self, input: CompanyInput, options: ImportOptions) -> ImportOutcome {
        if let Err(errors) = input.validate() {
            return row_error(errors);
        }

        let existing = match input.unified_number.as_deref() {
            Some(unified) => match self.companies.find_by_unified_number(unified).await {
                Ok(existing) => existing,
                Err(e) => return row_error(e),
            },
            None => None,
        };
        if existing.is_some() && !options.update_existing {
            return ImportOutcome::Skipped;
        }

        if let Some(company) = &existing {
            let count = match self.companies.count_employees(company.id).await {
                Ok(count) => count,
                Err(e) => return row_error(e),
            };
            if let Err(e) = ensure_limit_covers_headcount(input.max_employees, count) {
                return row_error(e);
            }
        }

        match (existing, options.dry_run) {
            (Some(_), true) => ImportOutcome::Updated,
            (None, true) => ImportOutcome::Created,
            (Some(company), false) => match self.companies.update(company.id, &input).await {
                Ok(_) => ImportOutcome::Updated,
                Err(e) => row_error(e),
            },
            (None, false) => match self.companies.create(&input).await {
                Ok(_) => ImportOutcome::Created,
                Err(e) => row_error(e),
            },
        }
    }
}

fn record_summary(kind: &'static str, summary: &ImportSummary) {
    if summary.dry_run {
        return;
    }
    record_import_rows(kind, "created", u64::from(summary.created));
    record_import_rows(kind, "updated", u64::from(summary.updated));
    record_import_rows(kind, "skipped", u64::from(summary.skipped));
    record_import_rows(kind, "failed", summary.failed() as u64);
}
