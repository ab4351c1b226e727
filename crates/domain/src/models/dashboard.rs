//! Dashboard statistics.

use serde::Serialize;
use std::collections::BTreeMap;

use super::alert::AlertStats;
use super::expiry::{DocumentType, ExpiryStatus};

/// Count of documents per band for one document type.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub expired: i64,
    pub urgent: i64,
    pub high: i64,
    pub medium: i64,
    pub valid: i64,
    pub no_expiry: i64,
}

impl StatusBreakdown {
    pub fn add(&mut self, status: ExpiryStatus) {
        match status {
            ExpiryStatus::Expired => self.expired += 1,
            ExpiryStatus::Urgent => self.urgent += 1,
            ExpiryStatus::High => self.high += 1,
            ExpiryStatus::Medium => self.medium += 1,
            ExpiryStatus::Valid => self.valid += 1,
            ExpiryStatus::NoExpiry => self.no_expiry += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_companies: i64,
    pub total_employees: i64,
    pub total_projects: i64,
    pub unassigned_employees: i64,
    pub documents: BTreeMap<DocumentType, StatusBreakdown>,
    pub alerts: AlertStats,
}
