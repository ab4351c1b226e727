//! Advanced search request/response models.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::company::Company;
use super::employee::Employee;

/// Window used by the "expiring soon" filters.
pub const EXPIRING_SOON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Employees,
    Companies,
    #[default]
    Both,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Employees => "employees",
            SearchType::Companies => "companies",
            SearchType::Both => "both",
        }
    }

    pub fn includes_employees(&self) -> bool {
        matches!(self, SearchType::Employees | SearchType::Both)
    }

    pub fn includes_companies(&self) -> bool {
        matches!(self, SearchType::Companies | SearchType::Both)
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "employees" => Ok(SearchType::Employees),
            "companies" => Ok(SearchType::Companies),
            "both" | "all" => Ok(SearchType::Both),
            _ => Err(format!("Unknown search type: {}", s)),
        }
    }
}

/// Coarse document state for search filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStatusFilter {
    Expired,
    /// Within [`EXPIRING_SOON_DAYS`] and not yet expired.
    ExpiringSoon,
    Valid,
    NoExpiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityFilter {
    /// Date recorded and not passed.
    Active,
    /// Passed or missing.
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyDateFilter {
    CommercialExpiring,
    InsuranceExpiring,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct EmployeeFilters {
    pub nationality: Option<String>,
    pub company_id: Option<Uuid>,
    pub profession: Option<String>,
    pub project_name: Option<String>,
    pub residence_status: Option<DateStatusFilter>,
    pub contract_status: Option<DateStatusFilter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct CompanyFilters {
    pub company_type: Option<String>,
    pub commercial_reg_status: Option<ActivityFilter>,
    pub insurance_status: Option<ActivityFilter>,
    pub date_filter: Option<CompanyDateFilter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct SearchFilters {
    pub employees: EmployeeFilters,
    pub companies: CompanyFilters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SearchRequest {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub query: String,

    #[serde(default)]
    pub search_type: SearchType,

    #[serde(default)]
    pub filters: SearchFilters,

    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EmployeeHit {
    #[serde(flatten)]
    pub employee: Employee,
    pub company_name: Option<String>,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CompanyHit {
    #[serde(flatten)]
    pub company: Company,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchResults {
    pub employees: Vec<EmployeeHit>,
    pub companies: Vec<CompanyHit>,
    /// Matches across both kinds before the per-kind limit.
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: SearchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.search_type, SearchType::Both);
        assert!(req.query.is_empty());
        assert_eq!(req.filters, SearchFilters::default());
    }

    #[test]
    fn test_partial_filters() {
        let req: SearchRequest = serde_json::from_str(
            r#"{"query":"أحمد","filters":{"employees":{"residence_status":"expiring_soon"}}}"#,
        )
        .unwrap();
        assert_eq!(
            req.filters.employees.residence_status,
            Some(DateStatusFilter::ExpiringSoon)
        );
        assert!(req.filters.companies.company_type.is_none());
    }

    #[test]
    fn test_search_type_scope() {
        assert!(SearchType::Both.includes_employees() && SearchType::Both.includes_companies());
        assert!(!SearchType::Companies.includes_employees());
        assert_eq!("all".parse::<SearchType>().unwrap(), SearchType::Both);
    }
}
