//! Expiry classification.
//!
//! A single pure function maps an optional expiry date plus a threshold
//! triple onto a severity band. Every tracked document (employee and
//! company alike) goes through [`classify`], keyed by [`DocumentType`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Severity band for one document.
///
/// Variants are declared in severity order, so `Ord` gives
/// `Expired < Urgent < High < Medium < Valid`. `NoExpiry` sorts last: a
/// document with no recorded date is never more urgent than a valid one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    Urgent,
    High,
    Medium,
    Valid,
    NoExpiry,
}

impl ExpiryStatus {
    pub const ALL: [ExpiryStatus; 6] = [
        ExpiryStatus::Expired,
        ExpiryStatus::Urgent,
        ExpiryStatus::High,
        ExpiryStatus::Medium,
        ExpiryStatus::Valid,
        ExpiryStatus::NoExpiry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryStatus::Expired => "expired",
            ExpiryStatus::Urgent => "urgent",
            ExpiryStatus::High => "high",
            ExpiryStatus::Medium => "medium",
            ExpiryStatus::Valid => "valid",
            ExpiryStatus::NoExpiry => "no_expiry",
        }
    }

    /// Arabic label shown in tables and exports.
    pub fn label(&self) -> &'static str {
        match self {
            ExpiryStatus::Expired => "منتهي",
            ExpiryStatus::Urgent => "عاجل",
            ExpiryStatus::High => "هام",
            ExpiryStatus::Medium => "متوسط",
            ExpiryStatus::Valid => "ساري",
            ExpiryStatus::NoExpiry => "غير محدد",
        }
    }

    pub fn color_class(&self) -> &'static str {
        match self {
            ExpiryStatus::Expired => "bg-red-100 text-red-800 border-red-300",
            ExpiryStatus::Urgent => "bg-orange-100 text-orange-800 border-orange-300",
            ExpiryStatus::High => "bg-yellow-100 text-yellow-800 border-yellow-300",
            ExpiryStatus::Medium => "bg-blue-100 text-blue-800 border-blue-300",
            ExpiryStatus::Valid => "bg-green-100 text-green-800 border-green-300",
            ExpiryStatus::NoExpiry => "bg-gray-100 text-gray-600 border-gray-300",
        }
    }

    /// Bands that show up on the alerts page.
    pub fn is_alerting(&self) -> bool {
        matches!(
            self,
            ExpiryStatus::Expired | ExpiryStatus::Urgent | ExpiryStatus::High | ExpiryStatus::Medium
        )
    }

    /// Bands included in the daily digest.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            ExpiryStatus::Expired | ExpiryStatus::Urgent | ExpiryStatus::High
        )
    }
}

impl std::fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpiryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown expiry status: {}", s))
    }
}

/// Day thresholds for one document type. Sane input has
/// `urgent_days <= high_days <= medium_days`; [`classify`] does not check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryThresholds {
    pub urgent_days: i64,
    pub high_days: i64,
    pub medium_days: i64,
}

impl ExpiryThresholds {
    pub const fn new(urgent_days: i64, high_days: i64, medium_days: i64) -> Self {
        Self {
            urgent_days,
            high_days,
            medium_days,
        }
    }

    /// Ordering check applied when thresholds are saved.
    pub fn validate_ordering(&self) -> Result<(), String> {
        if self.urgent_days < 0 {
            return Err("عدد أيام الحالة العاجلة لا يمكن أن يكون سالباً".to_string());
        }
        if self.urgent_days > self.high_days {
            return Err("أيام الحالة العاجلة يجب ألا تتجاوز أيام الحالة الهامة".to_string());
        }
        if self.high_days > self.medium_days {
            return Err("أيام الحالة الهامة يجب ألا تتجاوز أيام الحالة المتوسطة".to_string());
        }
        Ok(())
    }
}

impl Default for ExpiryThresholds {
    fn default() -> Self {
        Self::new(7, 15, 30)
    }
}

/// Who holds a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentOwner {
    Employee,
    Company,
}

impl DocumentOwner {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentOwner::Employee => "employee",
            DocumentOwner::Company => "company",
        }
    }
}

/// Every tracked document with an expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Residence,
    Contract,
    HealthInsurance,
    HiredWorkerContract,
    CommercialRegistration,
    SocialInsurance,
    PowerSubscription,
    MoqeemSubscription,
}

impl DocumentType {
    pub const ALL: [DocumentType; 8] = [
        DocumentType::Residence,
        DocumentType::Contract,
        DocumentType::HealthInsurance,
        DocumentType::HiredWorkerContract,
        DocumentType::CommercialRegistration,
        DocumentType::SocialInsurance,
        DocumentType::PowerSubscription,
        DocumentType::MoqeemSubscription,
    ];

    pub fn owner(&self) -> DocumentOwner {
        match self {
            DocumentType::Residence
            | DocumentType::Contract
            | DocumentType::HealthInsurance
            | DocumentType::HiredWorkerContract => DocumentOwner::Employee,
            DocumentType::CommercialRegistration
            | DocumentType::SocialInsurance
            | DocumentType::PowerSubscription
            | DocumentType::MoqeemSubscription => DocumentOwner::Company,
        }
    }

    pub fn for_owner(owner: DocumentOwner) -> impl Iterator<Item = DocumentType> {
        DocumentType::ALL
            .into_iter()
            .filter(move |doc| doc.owner() == owner)
    }

    /// Prefix of the `<prefix>_{urgent,high,medium}_days` settings keys.
    pub fn settings_prefix(&self) -> &'static str {
        match self {
            DocumentType::Residence => "residence",
            DocumentType::Contract => "contract",
            DocumentType::HealthInsurance => "health_insurance",
            DocumentType::HiredWorkerContract => "hired_worker_contract",
            DocumentType::CommercialRegistration => "commercial_reg",
            DocumentType::SocialInsurance => "social_insurance",
            DocumentType::PowerSubscription => "power_subscription",
            DocumentType::MoqeemSubscription => "moqeem_subscription",
        }
    }

    /// Column on the owning table that holds the date.
    pub fn column(&self) -> &'static str {
        match self {
            DocumentType::Residence => "residence_expiry",
            DocumentType::Contract => "contract_expiry",
            DocumentType::HealthInsurance => "health_insurance_expiry",
            DocumentType::HiredWorkerContract => "hired_worker_contract_expiry",
            DocumentType::CommercialRegistration => "commercial_registration_expiry",
            DocumentType::SocialInsurance => "social_insurance_expiry",
            DocumentType::PowerSubscription => "power_subscription_expiry",
            DocumentType::MoqeemSubscription => "moqeem_subscription_expiry",
        }
    }

    pub fn arabic_name(&self) -> &'static str {
        match self {
            DocumentType::Residence => "الإقامة",
            DocumentType::Contract => "عقد العمل",
            DocumentType::HealthInsurance => "التأمين الصحي",
            DocumentType::HiredWorkerContract => "عقد أجير",
            DocumentType::CommercialRegistration => "السجل التجاري",
            DocumentType::SocialInsurance => "التأمينات الاجتماعية",
            DocumentType::PowerSubscription => "اشتراك قوى",
            DocumentType::MoqeemSubscription => "اشتراك مقيم",
        }
    }

    pub fn default_thresholds(&self) -> ExpiryThresholds {
        match self {
            DocumentType::HealthInsurance => ExpiryThresholds::new(30, 45, 60),
            _ => ExpiryThresholds::default(),
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.settings_prefix())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|doc| doc.settings_prefix() == s || doc.column() == s)
            .ok_or_else(|| format!("Unknown document type: {}", s))
    }
}

/// Calendar days from `today` until `expiry`; negative once passed.
pub fn days_between(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

/// Classifies one expiry date.
///
/// `None` means no date was recorded and yields [`ExpiryStatus::NoExpiry`].
/// Otherwise: passed dates are `Expired`, then each threshold is tried in
/// ascending order with an inclusive bound.
pub fn classify(
    expiry: Option<NaiveDate>,
    thresholds: &ExpiryThresholds,
    today: NaiveDate,
) -> ExpiryStatus {
    let Some(expiry) = expiry else {
        return ExpiryStatus::NoExpiry;
    };

    let days = days_between(expiry, today);
    if days < 0 {
        ExpiryStatus::Expired
    } else if days <= thresholds.urgent_days {
        ExpiryStatus::Urgent
    } else if days <= thresholds.high_days {
        ExpiryStatus::High
    } else if days <= thresholds.medium_days {
        ExpiryStatus::Medium
    } else {
        ExpiryStatus::Valid
    }
}

/// Status of one document with the numbers behind it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentStatus {
    pub document: DocumentType,
    pub expiry_date: Option<NaiveDate>,
    pub days_remaining: Option<i64>,
    pub status: ExpiryStatus,
    pub label: String,
    pub color_class: String,
}

impl DocumentStatus {
    pub fn evaluate(
        document: DocumentType,
        expiry: Option<NaiveDate>,
        thresholds: &ExpiryThresholds,
        today: NaiveDate,
    ) -> Self {
        let status = classify(expiry, thresholds, today);
        Self {
            document,
            expiry_date: expiry,
            days_remaining: expiry.map(|d| days_between(d, today)),
            status,
            label: status.label().to_string(),
            color_class: status.color_class().to_string(),
        }
    }
}

/// Anything that carries dated documents.
pub trait HasDocuments {
    fn expiry_for(&self, document: DocumentType) -> Option<NaiveDate>;
}
