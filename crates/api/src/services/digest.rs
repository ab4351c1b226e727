//! Daily expiry digest: which alerts to mail and how the mail looks.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use domain::models::{DocumentOwner, ExpiryAlert};
use serde_json::Value as JsonValue;

use crate::services::email::EmailMessage;

/// Alert id to the time it was last mailed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentLog {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl SentLog {
    /// Reads the stored map. Entries that are not RFC 3339 timestamps are
    /// dropped.
    pub fn from_json(value: Option<&JsonValue>) -> Self {
        let entries = value
            .and_then(JsonValue::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(id, ts)| {
                        let ts = DateTime::parse_from_rfc3339(ts.as_str()?).ok()?;
                        Some((id.clone(), ts.with_timezone(&Utc)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { entries }
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.entries
                .iter()
                .map(|(id, ts)| (id.clone(), JsonValue::String(ts.to_rfc3339())))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn was_sent_since(&self, alert_id: &str, since: DateTime<Utc>) -> bool {
        self.entries.get(alert_id).map_or(false, |ts| *ts > since)
    }

    pub fn mark_sent<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>, now: DateTime<Utc>) {
        for id in ids {
            self.entries.insert(id.to_string(), now);
        }
    }

    /// Drops entries older than `retention`.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: Duration) {
        let cutoff = now - retention;
        self.entries.retain(|_, ts| *ts >= cutoff);
    }
}

/// Candidates not mailed within `resend_after`.
pub fn unsent<'a>(
    candidates: Vec<&'a ExpiryAlert>,
    sent: &SentLog,
    now: DateTime<Utc>,
    resend_after: Duration,
) -> Vec<&'a ExpiryAlert> {
    let since = now - resend_after;
    candidates
        .into_iter()
        .filter(|a| !sent.was_sent_since(&a.id, since))
        .collect()
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn html_table(title: &str, alerts: &[&ExpiryAlert]) -> String {
    let mut html = format!(
        "<h3>{}</h3>\n<table border=\"1\" cellpadding=\"6\" style=\"border-collapse:collapse\">\n\
         <tr><th>الاسم</th><th>المستند</th><th>تاريخ الانتهاء</th></tr>\n",
        title
    );
    for alert in alerts {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&alert.subject.name),
            escape_html(&alert.document_name),
            alert.expiry_date.format("%Y-%m-%d")
        ));
    }
    html.push_str("</table>\n");
    html
}

fn text_section(title: &str, alerts: &[&ExpiryAlert]) -> String {
    let mut text = format!("{}\n", title);
    for alert in alerts {
        text.push_str(&format!(
            "- {} | {} | {}\n",
            alert.subject.name,
            alert.document_name,
            alert.expiry_date.format("%Y-%m-%d")
        ));
    }
    text
}

/// One message with an employee table and a company table. Empty tables
/// are left out.
pub fn render(to: &str, alerts: &[&ExpiryAlert], today: NaiveDate) -> EmailMessage {
    let (employees, companies): (Vec<&ExpiryAlert>, Vec<&ExpiryAlert>) = alerts
        .iter()
        .copied()
        .partition(|a| a.subject.kind == DocumentOwner::Employee);

    let subject = format!(
        "تنبيهات انتهاء المستندات ({}) - {}",
        alerts.len(),
        today.format("%Y-%m-%d")
    );

    let mut html = String::from(
        "<div dir=\"rtl\" style=\"font-family:Tahoma,Arial,sans-serif\">\n\
         <h2>تنبيهات انتهاء المستندات</h2>\n",
    );
    let mut text = String::from("تنبيهات انتهاء المستندات\n\n");
    if !employees.is_empty() {
        html.push_str(&html_table("مستندات الموظفين", &employees));
        text.push_str(&text_section("مستندات الموظفين", &employees));
    }
    if !companies.is_empty() {
        html.push_str(&html_table("مستندات المؤسسات", &companies));
        text.push_str(&text_section("مستندات المؤسسات", &companies));
    }
    html.push_str("</div>\n");

    EmailMessage {
        to: to.to_string(),
        subject,
        body_text: text,
        body_html: Some(html),
    }
}
