//! Section/action permission matrix.
//!
//! Stored per user as JSON shaped like
//! `{"employees": {"view": true, "create": false, ...}, ...}`. Admins ignore
//! the stored value and always hold every permission.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    View,
    Create,
    Edit,
    Delete,
    Import,
    Export,
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::View => "view",
            PermissionAction::Create => "create",
            PermissionAction::Edit => "edit",
            PermissionAction::Delete => "delete",
            PermissionAction::Import => "import",
            PermissionAction::Export => "export",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PermissionAction::View => "عرض",
            PermissionAction::Create => "إضافة",
            PermissionAction::Edit => "تعديل",
            PermissionAction::Delete => "حذف",
            PermissionAction::Import => "استيراد",
            PermissionAction::Export => "تصدير",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionSection {
    Dashboard,
    Employees,
    Companies,
    Projects,
    Users,
    Alerts,
    AdvancedSearch,
    Reports,
    ActivityLogs,
    ImportExport,
    Settings,
    AdminSettings,
}

use PermissionAction::*;

impl PermissionSection {
    pub const ALL: [PermissionSection; 12] = [
        PermissionSection::Dashboard,
        PermissionSection::Employees,
        PermissionSection::Companies,
        PermissionSection::Projects,
        PermissionSection::Users,
        PermissionSection::Alerts,
        PermissionSection::AdvancedSearch,
        PermissionSection::Reports,
        PermissionSection::ActivityLogs,
        PermissionSection::ImportExport,
        PermissionSection::Settings,
        PermissionSection::AdminSettings,
    ];

    /// Key used in the stored JSON.
    pub fn key(&self) -> &'static str {
        match self {
            PermissionSection::Dashboard => "dashboard",
            PermissionSection::Employees => "employees",
            PermissionSection::Companies => "companies",
            PermissionSection::Projects => "projects",
            PermissionSection::Users => "users",
            PermissionSection::Alerts => "alerts",
            PermissionSection::AdvancedSearch => "advancedSearch",
            PermissionSection::Reports => "reports",
            PermissionSection::ActivityLogs => "activityLogs",
            PermissionSection::ImportExport => "importExport",
            PermissionSection::Settings => "settings",
            PermissionSection::AdminSettings => "adminSettings",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PermissionSection::Dashboard => "الرئيسية",
            PermissionSection::Employees => "الموظفين",
            PermissionSection::Companies => "المؤسسات",
            PermissionSection::Projects => "المشاريع",
            PermissionSection::Users => "المستخدمين",
            PermissionSection::Alerts => "التنبيهات",
            PermissionSection::AdvancedSearch => "البحث المتقدم",
            PermissionSection::Reports => "التقارير",
            PermissionSection::ActivityLogs => "سجل النشاطات",
            PermissionSection::ImportExport => "استيراد/تصدير",
            PermissionSection::Settings => "إعدادات التنبيهات",
            PermissionSection::AdminSettings => "إعدادات النظام",
        }
    }

    pub fn actions(&self) -> &'static [PermissionAction] {
        match self {
            PermissionSection::Employees
            | PermissionSection::Companies
            | PermissionSection::Projects
            | PermissionSection::Users => &[View, Create, Edit, Delete],
            PermissionSection::Settings | PermissionSection::AdminSettings => &[View, Edit],
            PermissionSection::Reports => &[View, Export],
            PermissionSection::ImportExport => &[View, Import, Export],
            PermissionSection::Dashboard
            | PermissionSection::Alerts
            | PermissionSection::AdvancedSearch
            | PermissionSection::ActivityLogs => &[View],
        }
    }

    /// Granted to regular users when nothing is stored.
    fn default_grant(&self, action: PermissionAction) -> bool {
        action == View
            && matches!(
                self,
                PermissionSection::Dashboard
                    | PermissionSection::Employees
                    | PermissionSection::Companies
                    | PermissionSection::Projects
                    | PermissionSection::Alerts
                    | PermissionSection::AdvancedSearch
                    | PermissionSection::Reports
            )
    }
}

impl FromStr for PermissionSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionSection::ALL
            .into_iter()
            .find(|section| section.key() == s)
            .ok_or_else(|| format!("Unknown permission section: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix {
    grants: BTreeMap<PermissionSection, BTreeMap<PermissionAction, bool>>,
}

impl Default for PermissionMatrix {
    fn default() -> Self {
        Self::build(|section, action| section.default_grant(action))
    }
}

impl PermissionMatrix {
    fn build(grant: impl Fn(PermissionSection, PermissionAction) -> bool) -> Self {
        let grants = PermissionSection::ALL
            .into_iter()
            .map(|section| {
                let actions = section
                    .actions()
                    .iter()
                    .map(|&action| (action, grant(section, action)))
                    .collect();
                (section, actions)
            })
            .collect();
        Self { grants }
    }

    pub fn full() -> Self {
        Self::build(|_, _| true)
    }

    pub fn none() -> Self {
        Self::build(|_, _| false)
    }

    /// Builds a complete matrix from whatever JSON is stored. Missing or
    /// non-boolean entries take the default; unknown keys are dropped.
    pub fn normalize(value: &JsonValue) -> Self {
        let defaults = Self::default();
        Self::build(|section, action| {
            value
                .get(section.key())
                .and_then(|s| s.get(action.as_str()))
                .and_then(JsonValue::as_bool)
                .unwrap_or_else(|| defaults.allows(section, action))
        })
    }

    /// Effective matrix for a role: admins always get [`PermissionMatrix::full`].
    pub fn effective(role: super::user::Role, stored: &JsonValue) -> Self {
        match role {
            super::user::Role::Admin => Self::full(),
            super::user::Role::User => Self::normalize(stored),
        }
    }

    /// Actions a section does not define are always denied.
    pub fn allows(&self, section: PermissionSection, action: PermissionAction) -> bool {
        self.grants
            .get(&section)
            .and_then(|actions| actions.get(&action))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, section: PermissionSection, action: PermissionAction, granted: bool) {
        if let Some(actions) = self.grants.get_mut(&section) {
            if let Some(slot) = actions.get_mut(&action) {
                *slot = granted;
            }
        }
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Section/action catalogue for building permission editors.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionSchemaEntry {
    pub section: PermissionSection,
    pub label: &'static str,
    pub actions: Vec<PermissionActionEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionActionEntry {
    pub action: PermissionAction,
    pub label: &'static str,
}

pub fn permission_schema() -> Vec<PermissionSchemaEntry> {
    PermissionSection::ALL
        .into_iter()
        .map(|section| PermissionSchemaEntry {
            section,
            label: section.label(),
            actions: section
                .actions()
                .iter()
                .map(|&action| PermissionActionEntry {
                    action,
                    label: action.label(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let m = PermissionMatrix::default();
        assert!(m.allows(PermissionSection::Employees, View));
        assert!(!m.allows(PermissionSection::Employees, Create));
        assert!(!m.allows(PermissionSection::Users, View));
        assert!(!m.allows(PermissionSection::ImportExport, View));
        assert!(m.allows(PermissionSection::Reports, View));
        assert!(!m.allows(PermissionSection::Reports, Export));
        assert!(m.allows(PermissionSection::AdvancedSearch, View));
    }

    #[test]
    fn test_undefined_action_denied_even_for_full() {
        let m = PermissionMatrix::full();
        assert!(m.allows(PermissionSection::Companies, Delete));
        assert!(!m.allows(PermissionSection::Alerts, Delete));
        assert!(!m.allows(PermissionSection::Reports, Import));
    }

    #[test]
    fn test_normalize_fills_gaps() {
        let stored = json!({
            "employees": {"create": true, "delete": "yes"},
            "importExport": {"view": true, "export": true},
            "mystery": {"view": true}
        });
        let m = PermissionMatrix::normalize(&stored);

        assert!(m.allows(PermissionSection::Employees, View));
        assert!(m.allows(PermissionSection::Employees, Create));
        assert!(!m.allows(PermissionSection::Employees, Delete));
        assert!(m.allows(PermissionSection::ImportExport, Export));
        assert!(!m.allows(PermissionSection::ImportExport, Import));
        assert!(m.allows(PermissionSection::Dashboard, View));
    }

    #[test]
    fn test_normalize_garbage() {
        assert_eq!(PermissionMatrix::normalize(&json!(null)), PermissionMatrix::default());
        assert_eq!(PermissionMatrix::normalize(&json!("admin")), PermissionMatrix::default());
    }

    #[test]
    fn test_stored_false_overrides_default() {
        let m = PermissionMatrix::normalize(&json!({"employees": {"view": false}}));
        assert!(!m.allows(PermissionSection::Employees, View));
    }

    #[test]
    fn test_admin_ignores_stored() {
        let m = PermissionMatrix::effective(Role::Admin, &json!({"users": {"view": false}}));
        assert!(m.allows(PermissionSection::Users, View));
        assert!(m.allows(PermissionSection::AdminSettings, Edit));
    }

    #[test]
    fn test_json_shape() {
        let json = PermissionMatrix::default().to_json();
        assert_eq!(json["advancedSearch"]["view"], true);
        assert_eq!(json["importExport"]["import"], false);
        assert!(json["alerts"].get("delete").is_none());
        assert_eq!(PermissionMatrix::normalize(&json), PermissionMatrix::default());
    }

    #[test]
    fn test_set_ignores_undefined_actions() {
        let mut m = PermissionMatrix::none();
        m.set(PermissionSection::Alerts, Delete, true);
        assert!(!m.allows(PermissionSection::Alerts, Delete));
        m.set(PermissionSection::Alerts, View, true);
        assert!(m.allows(PermissionSection::Alerts, View));
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = permission_schema();
        assert_eq!(schema.len(), PermissionSection::ALL.len());
        let import = schema
            .iter()
            .find(|e| e.section == PermissionSection::ImportExport)
            .unwrap();
        assert_eq!(import.actions.len(), 3);
    }
}
