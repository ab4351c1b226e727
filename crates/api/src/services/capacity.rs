//! Company head-count limit.

use persistence::repositories::CompanyRepository;
use uuid::Uuid;

use crate::error::ApiError;

pub const CAPACITY_EXCEEDED_MESSAGE: &str = "تم الوصول للحد الأقصى لعدد الموظفين في هذه المؤسسة";
const COMPANY_NOT_FOUND_MESSAGE: &str = "المؤسسة المحددة غير موجودة";

/// `true` when one more employee fits under `max_employees`.
pub fn has_room(max_employees: Option<i32>, current_count: i64) -> bool {
    max_employees.map_or(true, |max| current_count < i64::from(max))
}

/// A new limit may never drop below the company's current head count.
pub fn ensure_limit_covers_headcount(
    max_employees: Option<i32>,
    current_count: i64,
) -> Result<(), ApiError> {
    match max_employees {
        Some(max) if i64::from(max) < current_count => Err(ApiError::validation(format!(
            "لا يمكن تعيين الحد الأقصى ({}) أقل من عدد الموظفين الحالي ({})",
            max, current_count
        ))),
        _ => Ok(()),
    }
}

/// Checks that an employee can join `target`. `current` is the company the
/// employee already belongs to; staying in the same company never counts
/// against the limit.
pub async fn ensure_company_has_room(
    companies: &CompanyRepository,
    target: Option<Uuid>,
    current: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(company_id) = target else {
        return Ok(());
    };
    if current == Some(company_id) {
        return Ok(());
    }

    let (company, employee_count) = companies
        .find_by_id(company_id)
        .await?
        .ok_or_else(|| ApiError::validation(COMPANY_NOT_FOUND_MESSAGE))?;

    if has_room(company.max_employees, employee_count) {
        Ok(())
    } else {
        tracing::info!(
            company_id = %company_id,
            max_employees = ?company.max_employees,
            employee_count,
            "Company is at capacity"
        );
        Err(ApiError::Conflict(CAPACITY_EXCEEDED_MESSAGE.to_string()))
    }
}
