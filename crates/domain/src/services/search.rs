//! Fuzzy search with structured filters over employees and companies.
//!
//! Records are filtered first, then scored with `nucleo-matcher` against
//! each searchable field; a record's score is its best field score.

use chrono::NaiveDate;
use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use serde_json::Value as JsonValue;

use crate::models::company::Company;
use crate::models::employee::Employee;
use crate::models::expiry::days_between;
use crate::models::search::{
    ActivityFilter, CompanyDateFilter, CompanyFilters, CompanyHit, DateStatusFilter,
    EmployeeFilters, EmployeeHit, SearchRequest, SearchResults, EXPIRING_SOON_DAYS,
};

const DEFAULT_LIMIT: usize = 200;

/// Coarse status used by search filters (not the configurable bands).
pub fn date_status(expiry: Option<NaiveDate>, today: NaiveDate) -> DateStatusFilter {
    match expiry.map(|d| days_between(d, today)) {
        None => DateStatusFilter::NoExpiry,
        Some(days) if days < 0 => DateStatusFilter::Expired,
        Some(days) if days <= EXPIRING_SOON_DAYS => DateStatusFilter::ExpiringSoon,
        Some(_) => DateStatusFilter::Valid,
    }
}

fn activity(expiry: Option<NaiveDate>, today: NaiveDate) -> ActivityFilter {
    match expiry {
        Some(date) if date >= today => ActivityFilter::Active,
        _ => ActivityFilter::Inactive,
    }
}

fn expiring_soon(expiry: Option<NaiveDate>, today: NaiveDate) -> bool {
    date_status(expiry, today) == DateStatusFilter::ExpiringSoon
}

fn same_text(filter: &Option<String>, value: &Option<String>) -> bool {
    match filter.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        None => true,
        Some(wanted) => value
            .as_deref()
            .is_some_and(|v| v.trim().to_lowercase() == wanted.to_lowercase()),
    }
}

pub fn employee_matches_filters(
    employee: &Employee,
    filters: &EmployeeFilters,
    today: NaiveDate,
) -> bool {
    same_text(&filters.nationality, &employee.nationality)
        && same_text(&filters.profession, &employee.profession)
        && same_text(&filters.project_name, &employee.project_name)
        && filters
            .company_id
            .map_or(true, |id| employee.company_id == Some(id))
        && filters
            .residence_status
            .map_or(true, |s| date_status(employee.residence_expiry, today) == s)
        && filters
            .contract_status
            .map_or(true, |s| date_status(employee.contract_expiry, today) == s)
}

pub fn company_matches_filters(
    company: &Company,
    filters: &CompanyFilters,
    today: NaiveDate,
) -> bool {
    let date_ok = match filters.date_filter {
        None => true,
        Some(CompanyDateFilter::CommercialExpiring) => {
            expiring_soon(company.commercial_registration_expiry, today)
        }
        Some(CompanyDateFilter::InsuranceExpiring) => {
            expiring_soon(company.social_insurance_expiry, today)
        }
    };

    date_ok
        && same_text(&filters.company_type, &company.company_type)
        && filters
            .commercial_reg_status
            .map_or(true, |s| activity(company.commercial_registration_expiry, today) == s)
        && filters
            .insurance_status
            .map_or(true, |s| activity(company.social_insurance_expiry, today) == s)
}

/// Flattens scalar values of an `additional_fields` object.
fn extra_values(fields: &JsonValue) -> Vec<String> {
    fields
        .as_object()
        .map(|map| {
            map.values()
                .filter_map(|v| match v {
                    JsonValue::String(s) => Some(s.clone()),
                    JsonValue::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn employee_fields(employee: &Employee) -> Vec<String> {
    let mut fields = vec![employee.name.clone(), employee.residence_number.clone()];
    fields.extend(
        [
            &employee.profession,
            &employee.nationality,
            &employee.phone,
            &employee.project_name,
            &employee.passport_number,
        ]
        .into_iter()
        .flatten()
        .cloned(),
    );
    fields.extend(extra_values(&employee.additional_fields));
    fields
}

fn company_fields(company: &Company) -> Vec<String> {
    let mut fields = vec![company.name.clone()];
    fields.extend(company.unified_number.clone());
    fields.extend(company.tax_number.map(|n| n.to_string()));
    fields.extend(company.company_type.clone());
    fields.extend(company.labor_subscription_number.clone());
    fields.extend(extra_values(&company.additional_fields));
    fields
}

/// Scores haystacks against one parsed query.
pub struct FuzzyScorer {
    pattern: Option<Pattern>,
    matcher: Matcher,
    buf: Vec<char>,
}

impl FuzzyScorer {
    pub fn new(query: &str) -> Self {
        let query = query.trim();
        let pattern = (!query.is_empty())
            .then(|| Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart));
        Self {
            pattern,
            matcher: Matcher::new(Config::DEFAULT),
            buf: Vec::new(),
        }
    }

    /// Best score across `fields`. An empty query matches everything with 0.
    pub fn best(&mut self, fields: &[String]) -> Option<u32> {
        let Some(pattern) = &self.pattern else {
            return Some(0);
        };
        fields
            .iter()
            .filter_map(|field| {
                pattern.score(Utf32Str::new(field, &mut self.buf), &mut self.matcher)
            })
            .max()
    }
}

/// Runs a search over already-loaded records.
pub fn search(
    request: &SearchRequest,
    employees: Vec<(Employee, Option<String>)>,
    companies: Vec<Company>,
    today: NaiveDate,
) -> SearchResults {
    let limit = request.limit.unwrap_or(DEFAULT_LIMIT);
    let mut scorer = FuzzyScorer::new(&request.query);

    let mut employee_hits: Vec<EmployeeHit> = if request.search_type.includes_employees() {
        employees
            .into_iter()
            .filter(|(e, _)| employee_matches_filters(e, &request.filters.employees, today))
            .filter_map(|(employee, company_name)| {
                let mut fields = employee_fields(&employee);
                fields.extend(company_name.clone());
                scorer.best(&fields).map(|score| EmployeeHit {
                    employee,
                    company_name,
                    score,
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    let mut company_hits: Vec<CompanyHit> = if request.search_type.includes_companies() {
        companies
            .into_iter()
            .filter(|c| company_matches_filters(c, &request.filters.companies, today))
            .filter_map(|company| {
                scorer
                    .best(&company_fields(&company))
                    .map(|score| CompanyHit { company, score })
            })
            .collect()
    } else {
        Vec::new()
    };

    employee_hits.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.employee.name.cmp(&b.employee.name))
    });
    company_hits.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.company.name.cmp(&b.company.name))
    });
    let total = employee_hits.len() + company_hits.len();
    employee_hits.truncate(limit);
    company_hits.truncate(limit);

    SearchResults {
        total,
        employees: employee_hits,
        companies: company_hits,
    }
}
