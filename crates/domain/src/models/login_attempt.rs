//! Login attempt records and the lockout policy.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

/// Settings key: failed attempts allowed inside the lockout window.
pub const MAX_LOGIN_ATTEMPTS_KEY: &str = "max_login_attempts";

/// Settings key: lockout window in minutes.
pub const LOCKOUT_DURATION_MINUTES_KEY: &str = "lockout_duration_minutes";

const DEFAULT_MAX_LOGIN_ATTEMPTS: i64 = 5;
const DEFAULT_LOCKOUT_MINUTES: i64 = 30;
const MAX_LOCKOUT_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginAttemptKind {
    Success,
    Failed,
    /// Refused without checking the password.
    Locked,
}

impl LoginAttemptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginAttemptKind::Success => "success",
            LoginAttemptKind::Failed => "failed",
            LoginAttemptKind::Locked => "locked",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewLoginAttempt {
    pub email: String,
    pub user_id: Option<Uuid>,
    pub kind: LoginAttemptKind,
    pub failure_reason: Option<&'static str>,
    pub ip_address: Option<String>,
}

/// How many failures lock an e-mail address, and for how long.
///
/// A login is refused once `max_login_attempts` failures have been recorded
/// for the address within the last `lockout_duration_minutes`, counting only
/// failures after its latest successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct LoginPolicy {
    #[validate(range(min = 1, max = 100, message = "عدد المحاولات يجب أن يكون بين 1 و 100"))]
    pub max_login_attempts: i64,

    #[validate(range(min = 1, max = 1440, message = "مدة القفل يجب أن تكون بين 1 و 1440 دقيقة"))]
    pub lockout_duration_minutes: i64,
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self {
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            lockout_duration_minutes: DEFAULT_LOCKOUT_MINUTES,
        }
    }
}

impl LoginPolicy {
    /// Builds the policy from the two stored settings. Missing or
    /// out-of-range values fall back to the defaults one by one.
    pub fn from_settings(max_attempts: Option<&JsonValue>, lockout_minutes: Option<&JsonValue>) -> Self {
        let defaults = Self::default();
        Self {
            max_login_attempts: max_attempts
                .and_then(read_int)
                .filter(|n| (1..=100).contains(n))
                .unwrap_or(defaults.max_login_attempts),
            lockout_duration_minutes: lockout_minutes
                .and_then(read_int)
                .filter(|n| (1..=MAX_LOCKOUT_MINUTES).contains(n))
                .unwrap_or(defaults.lockout_duration_minutes),
        }
    }

    pub fn lockout_window(&self) -> Duration {
        Duration::minutes(self.lockout_duration_minutes.clamp(1, MAX_LOCKOUT_MINUTES))
    }

    pub fn is_locked(&self, recent_failures: i64) -> bool {
        recent_failures >= self.max_login_attempts
    }
}

// Values saved from the settings form may be strings ("5").
fn read_int(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_when_unset() {
        let policy = LoginPolicy::from_settings(None, None);
        assert_eq!(policy, LoginPolicy::default());
        assert_eq!(policy.max_login_attempts, 5);
        assert_eq!(policy.lockout_window(), Duration::minutes(30));
    }

    #[test]
    fn test_reads_numbers_and_strings() {
        let policy = LoginPolicy::from_settings(Some(&json!(3)), Some(&json!("15")));
        assert_eq!(policy.max_login_attempts, 3);
        assert_eq!(policy.lockout_duration_minutes, 15);
    }

    #[test]
    fn test_invalid_values_fall_back_per_field() {
        let policy = LoginPolicy::from_settings(Some(&json!(0)), Some(&json!(10)));
        assert_eq!(policy.max_login_attempts, 5);
        assert_eq!(policy.lockout_duration_minutes, 10);

        let policy = LoginPolicy::from_settings(Some(&json!("many")), Some(&json!(i64::MAX)));
        assert_eq!(policy, LoginPolicy::default());
    }

    #[test]
    fn test_is_locked_at_threshold() {
        let policy = LoginPolicy::default();
        assert!(!policy.is_locked(0));
        assert!(!policy.is_locked(4));
        assert!(policy.is_locked(5));
        assert!(policy.is_locked(9));
    }

    #[test]
    fn test_validation_ranges() {
        assert!(LoginPolicy::default().validate().is_ok());
        let bad = LoginPolicy {
            max_login_attempts: 0,
            lockout_duration_minutes: 2000,
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("max_login_attempts"));
        assert!(errors.field_errors().contains_key("lockout_duration_minutes"));
    }
}
