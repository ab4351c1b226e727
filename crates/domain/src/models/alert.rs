//! Expiry alert models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::expiry::{DocumentOwner, DocumentType, ExpiryStatus};

/// Alert priority. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Urgent,
    High,
    Medium,
}

impl AlertPriority {
    /// Priority for a band; `None` for bands that do not alert.
    pub fn from_status(status: ExpiryStatus) -> Option<Self> {
        match status {
            ExpiryStatus::Expired | ExpiryStatus::Urgent => Some(AlertPriority::Urgent),
            ExpiryStatus::High => Some(AlertPriority::High),
            ExpiryStatus::Medium => Some(AlertPriority::Medium),
            ExpiryStatus::Valid | ExpiryStatus::NoExpiry => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertPriority::Urgent => "urgent",
            AlertPriority::High => "high",
            AlertPriority::Medium => "medium",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertPriority::Urgent => "عاجل",
            AlertPriority::High => "هام",
            AlertPriority::Medium => "متوسط",
        }
    }
}

impl FromStr for AlertPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "urgent" => Ok(AlertPriority::Urgent),
            "high" => Ok(AlertPriority::High),
            "medium" => Ok(AlertPriority::Medium),
            _ => Err(format!("Unknown alert priority: {}", s)),
        }
    }
}

/// Holder of the expiring document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AlertSubject {
    pub kind: DocumentOwner,
    pub id: Uuid,
    pub name: String,
    /// Employer name for employee alerts.
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ExpiryAlert {
    /// `<alert_type>_<subject id>_<expiry date>`; stable while the date is unchanged.
    pub id: String,
    pub alert_type: String,
    pub document: DocumentType,
    pub document_name: String,
    pub priority: AlertPriority,
    pub status: ExpiryStatus,
    pub title: String,
    pub message: String,
    pub action_required: String,
    pub subject: AlertSubject,
    pub expiry_date: NaiveDate,
    pub days_remaining: i64,
    #[serde(default)]
    pub is_read: bool,
}

impl ExpiryAlert {
    pub fn alert_type_for(document: DocumentType) -> String {
        format!("{}_expiry", document.settings_prefix())
    }

    pub fn build_id(document: DocumentType, subject_id: Uuid, expiry: NaiveDate) -> String {
        format!(
            "{}_{}_{}",
            Self::alert_type_for(document),
            subject_id,
            expiry.format("%Y-%m-%d")
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListAlertsQuery {
    pub priority: Option<AlertPriority>,
    pub kind: Option<DocumentOwner>,
    pub document: Option<DocumentType>,
    #[serde(default)]
    pub unread_only: bool,
}

impl ListAlertsQuery {
    pub fn matches(&self, alert: &ExpiryAlert) -> bool {
        self.priority.map_or(true, |p| alert.priority == p)
            && self.kind.map_or(true, |k| alert.subject.kind == k)
            && self.document.map_or(true, |d| alert.document == d)
            && (!self.unread_only || !alert.is_read)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AlertStats {
    pub total: usize,
    pub urgent: usize,
    pub high: usize,
    pub medium: usize,
    pub expired: usize,
    pub unread: usize,
    pub employee_alerts: usize,
    pub company_alerts: usize,
}

impl AlertStats {
    pub fn from_alerts(alerts: &[ExpiryAlert]) -> Self {
        alerts.iter().fold(Self::default(), |mut stats, alert| {
            stats.total += 1;
            match alert.priority {
                AlertPriority::Urgent => stats.urgent += 1,
                AlertPriority::High => stats.high += 1,
                AlertPriority::Medium => stats.medium += 1,
            }
            if alert.status == ExpiryStatus::Expired {
                stats.expired += 1;
            }
            if !alert.is_read {
                stats.unread += 1;
            }
            match alert.subject.kind {
                DocumentOwner::Employee => stats.employee_alerts += 1,
                DocumentOwner::Company => stats.company_alerts += 1,
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_status() {
        assert_eq!(AlertPriority::from_status(ExpiryStatus::Expired), Some(AlertPriority::Urgent));
        assert_eq!(AlertPriority::from_status(ExpiryStatus::Urgent), Some(AlertPriority::Urgent));
        assert_eq!(AlertPriority::from_status(ExpiryStatus::High), Some(AlertPriority::High));
        assert_eq!(AlertPriority::from_status(ExpiryStatus::Medium), Some(AlertPriority::Medium));
        assert_eq!(AlertPriority::from_status(ExpiryStatus::Valid), None);
        assert_eq!(AlertPriority::from_status(ExpiryStatus::NoExpiry), None);
    }

    #[test]
    fn test_priority_order() {
        assert!(AlertPriority::Urgent < AlertPriority::High);
        assert!(AlertPriority::High < AlertPriority::Medium);
    }

    #[test]
    fn test_build_id() {
        let id = Uuid::nil();
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(
            ExpiryAlert::build_id(DocumentType::Residence, id, date),
            "residence_expiry_00000000-0000-0000-0000-000000000000_2024-06-10"
        );
        assert_eq!(
            ExpiryAlert::alert_type_for(DocumentType::CommercialRegistration),
            "commercial_reg_expiry"
        );
    }
}
