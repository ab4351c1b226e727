//! Expiry alert generation.
//!
//! Every dated document runs through the shared classifier; documents in an
//! alerting band become an [`ExpiryAlert`] with Arabic wording.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::models::alert::{AlertPriority, AlertSubject, ExpiryAlert};
use crate::models::company::Company;
use crate::models::employee::Employee;
use crate::models::expiry::{
    classify, days_between, DocumentOwner, DocumentType, ExpiryStatus, HasDocuments,
};
use crate::models::setting::ThresholdSettings;

/// Builds the alert for one document, or `None` when it is not alerting.
pub fn alert_for(
    subject: &AlertSubject,
    document: DocumentType,
    expiry: Option<NaiveDate>,
    thresholds: &ThresholdSettings,
    today: NaiveDate,
) -> Option<ExpiryAlert> {
    let expiry = expiry?;
    let status = classify(Some(expiry), &thresholds.get(document), today);
    let priority = AlertPriority::from_status(status)?;
    let days = days_between(expiry, today);
    let wording = Wording::new(document, subject, days, status);

    Some(ExpiryAlert {
        id: ExpiryAlert::build_id(document, subject.id, expiry),
        alert_type: ExpiryAlert::alert_type_for(document),
        document,
        document_name: document.arabic_name().to_string(),
        priority,
        status,
        title: wording.title(),
        message: wording.message(),
        action_required: wording.action_required(),
        subject: subject.clone(),
        expiry_date: expiry,
        days_remaining: days,
        is_read: false,
    })
}

fn alerts_for<T: HasDocuments>(
    holder: &T,
    subject: AlertSubject,
    thresholds: &ThresholdSettings,
    today: NaiveDate,
) -> Vec<ExpiryAlert> {
    DocumentType::for_owner(subject.kind)
        .filter_map(|doc| alert_for(&subject, doc, holder.expiry_for(doc), thresholds, today))
        .collect()
}

/// Alerts for employees paired with their company name.
pub fn employee_alerts(
    employees: &[(Employee, Option<String>)],
    thresholds: &ThresholdSettings,
    today: NaiveDate,
) -> Vec<ExpiryAlert> {
    employees
        .iter()
        .flat_map(|(employee, company_name)| {
            let subject = AlertSubject {
                kind: DocumentOwner::Employee,
                id: employee.id,
                name: employee.name.clone(),
                company_name: company_name.clone(),
            };
            alerts_for(employee, subject, thresholds, today)
        })
        .collect()
}

pub fn company_alerts(
    companies: &[Company],
    thresholds: &ThresholdSettings,
    today: NaiveDate,
) -> Vec<ExpiryAlert> {
    companies
        .iter()
        .flat_map(|company| {
            let subject = AlertSubject {
                kind: DocumentOwner::Company,
                id: company.id,
                name: company.name.clone(),
                company_name: None,
            };
            alerts_for(company, subject, thresholds, today)
        })
        .collect()
}

/// Urgent first, then fewest days remaining; ties broken by id so the
/// order is stable across requests.
pub fn sort_alerts(alerts: &mut [ExpiryAlert]) {
    alerts.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(a.days_remaining.cmp(&b.days_remaining))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Sets `is_read` from the caller's read set.
pub fn mark_read(alerts: &mut [ExpiryAlert], read_ids: &HashSet<String>) {
    for alert in alerts.iter_mut() {
        alert.is_read = read_ids.contains(&alert.id);
    }
}

/// Alerts that go into the daily digest: urgent and high only.
pub fn digest_candidates(alerts: &[ExpiryAlert]) -> Vec<&ExpiryAlert> {
    alerts
        .iter()
        .filter(|a| matches!(a.priority, AlertPriority::Urgent | AlertPriority::High))
        .collect()
}

struct Wording<'a> {
    document: &'a str,
    name: &'a str,
    days: i64,
    status: ExpiryStatus,
}

impl<'a> Wording<'a> {
    fn new(document: DocumentType, subject: &'a AlertSubject, days: i64, status: ExpiryStatus) -> Self {
        Self {
            document: document.arabic_name(),
            name: &subject.name,
            days,
            status,
        }
    }

    fn title(&self) -> String {
        match self.status {
            ExpiryStatus::Expired => format!("{} منتهية الصلاحية", self.document),
            ExpiryStatus::Urgent => format!("{} تنتهي قريباً جداً", self.document),
            ExpiryStatus::High => format!("{} تنتهي قريباً", self.document),
            _ => format!("متابعة {}", self.document),
        }
    }

    fn message(&self) -> String {
        let (doc, name, days) = (self.document, self.name, self.days);
        match (self.status, days) {
            (ExpiryStatus::Expired, _) => format!(
                "انتهت صلاحية {} لـ \"{}\" منذ {} يوم. يجب التجديد فوراً.",
                doc,
                name,
                days.abs()
            ),
            (_, 0) => format!("تنتهي صلاحية {} لـ \"{}\" اليوم. يجب التجديد فوراً.", doc, name),
            (_, 1) => format!("تنتهي صلاحية {} لـ \"{}\" غداً. يجب التجديد فوراً.", doc, name),
            (ExpiryStatus::Urgent, _) => format!(
                "تنتهي صلاحية {} لـ \"{}\" خلال {} أيام - إجراء فوري مطلوب.",
                doc, name, days
            ),
            (ExpiryStatus::High, _) => format!(
                "تنتهي صلاحية {} لـ \"{}\" خلال {} يوم - متابعة مطلوبة.",
                doc, name, days
            ),
            _ => format!("{} لـ \"{}\" ستنتهي خلال {} يوم.", doc, name, days),
        }
    }

    fn action_required(&self) -> String {
        let (doc, name) = (self.document, self.name);
        match self.status {
            ExpiryStatus::Expired => {
                format!("قم بتجديد {} لـ \"{}\" في أقرب وقت ممكن.", doc, name)
            }
            ExpiryStatus::Urgent | ExpiryStatus::High => format!(
                "قم بترتيب تجديد {} لـ \"{}\" خلال {} يوم القادمة.",
                doc,
                name,
                self.days.max(1)
            ),
            _ => format!("قم بمراجعة وتجديد {} لـ \"{}\" قبل انتهاء المدة.", doc, name),
        }
    }
}
