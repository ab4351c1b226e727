//! System settings and the expiry threshold configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

use super::expiry::{DocumentType, ExpiryThresholds};

/// Settings key holding the flat threshold blob.
pub const NOTIFICATION_THRESHOLDS_KEY: &str = "notification_thresholds";

/// Settings key holding `alert_id -> last digest send time`.
pub const DIGEST_LAST_SENT_KEY: &str = "expiry_digest_last_sent";

/// Row of the `system_settings` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SystemSetting {
    pub setting_key: String,
    pub setting_value: JsonValue,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Thresholds for every document type.
///
/// Persisted as a flat object: `{"residence_urgent_days": 7, ...}`. Reading
/// merges over per-document defaults, so a partially populated blob (or
/// one written by an older release) still yields a full set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdSettings {
    values: BTreeMap<DocumentType, ExpiryThresholds>,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            values: DocumentType::ALL
                .into_iter()
                .map(|doc| (doc, doc.default_thresholds()))
                .collect(),
        }
    }
}

impl ThresholdSettings {
    pub fn get(&self, document: DocumentType) -> ExpiryThresholds {
        self.values
            .get(&document)
            .copied()
            .unwrap_or_else(|| document.default_thresholds())
    }

    pub fn set(&mut self, document: DocumentType, thresholds: ExpiryThresholds) {
        self.values.insert(document, thresholds);
    }

    /// Parses a stored blob. Missing, non-integer, or non-object input falls
    /// back to defaults field by field; unknown keys are ignored.
    pub fn from_flat_json(value: &JsonValue) -> Self {
        let mut settings = Self::default();
        let Some(map) = value.as_object() else {
            return settings;
        };

        for doc in DocumentType::ALL {
            let defaults = doc.default_thresholds();
            let prefix = doc.settings_prefix();
            let read = |suffix: &str, fallback: i64| {
                map.get(&format!("{}_{}_days", prefix, suffix))
                    .and_then(read_days)
                    .unwrap_or(fallback)
            };
            settings.set(
                doc,
                ExpiryThresholds::new(
                    read("urgent", defaults.urgent_days),
                    read("high", defaults.high_days),
                    read("medium", defaults.medium_days),
                ),
            );
        }
        settings
    }

    pub fn to_flat_json(&self) -> JsonValue {
        let mut map = Map::new();
        for doc in DocumentType::ALL {
            let t = self.get(doc);
            let prefix = doc.settings_prefix();
            map.insert(format!("{}_urgent_days", prefix), t.urgent_days.into());
            map.insert(format!("{}_high_days", prefix), t.high_days.into());
            map.insert(format!("{}_medium_days", prefix), t.medium_days.into());
        }
        JsonValue::Object(map)
    }

    pub fn to_view(&self) -> Vec<DocumentThresholds> {
        DocumentType::ALL
            .into_iter()
            .map(|doc| {
                let t = self.get(doc);
                DocumentThresholds {
                    document: doc,
                    owner: doc.owner().as_str().to_string(),
                    arabic_name: doc.arabic_name().to_string(),
                    urgent_days: t.urgent_days,
                    high_days: t.high_days,
                    medium_days: t.medium_days,
                }
            })
            .collect()
    }
}

// Older rows stored numbers as strings ("30").
fn read_days(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One document's thresholds as exposed over the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DocumentThresholds {
    pub document: DocumentType,
    pub owner: String,
    pub arabic_name: String,
    pub urgent_days: i64,
    pub high_days: i64,
    pub medium_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ThresholdUpdate {
    pub document: DocumentType,
    pub urgent_days: i64,
    pub high_days: i64,
    pub medium_days: i64,
}

/// Partial update: documents not listed keep their current thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UpdateThresholdsRequest {
    pub thresholds: Vec<ThresholdUpdate>,
}

impl UpdateThresholdsRequest {
    /// Applies the update onto `current`, returning per-document errors.
    pub fn apply_to(
        &self,
        current: &ThresholdSettings,
    ) -> Result<ThresholdSettings, BTreeMap<String, String>> {
        let mut next = current.clone();
        let mut errors = BTreeMap::new();

        for update in &self.thresholds {
            let t = ExpiryThresholds::new(update.urgent_days, update.high_days, update.medium_days);
            let range_ok = [t.urgent_days, t.high_days, t.medium_days]
                .into_iter()
                .all(|d| shared::validation::validate_threshold_days(d).is_ok());

            if !range_ok {
                errors.insert(
                    update.document.settings_prefix().to_string(),
                    "عدد الأيام يجب أن يكون بين 0 و 3650".to_string(),
                );
            } else if let Err(message) = t.validate_ordering() {
                errors.insert(update.document.settings_prefix().to_string(), message);
            } else {
                next.set(update.document, t);
            }
        }

        if errors.is_empty() {
            Ok(next)
        } else {
            Err(errors)
        }
    }
}
