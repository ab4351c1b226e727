//! Field validators for Saudi registry identifiers.
//!
//! Each validator plugs into `validator` via
//! `#[validate(custom(function = "..."))]` and carries an Arabic message.
//! Optional fields hold `Option<String>`; the derive only calls the custom
//! function for `Some`, so the "no value" literal is accepted here too.

use validator::ValidationError;

/// Literal users type into optional fields to mean "not applicable".
pub const NO_VALUE_TEXT: &str = "لا يوجد";

lazy_static::lazy_static! {
    static ref DIGITS_REGEX: regex::Regex = regex::Regex::new(r"^\d+$").unwrap();
    static ref LABOR_SUBSCRIPTION_REGEX: regex::Regex = regex::Regex::new(r"^13-\d{7}$").unwrap();
    static ref PHONE_REGEX: regex::Regex = regex::Regex::new(r"^\+?\d{9,15}$").unwrap();
}

/// True for the "no value" literal. Empty input is not "no value".
pub fn is_no_value(value: &str) -> bool {
    value.trim() == NO_VALUE_TEXT
}

/// Maps blank input and the "no value" literal to `None`, trimming the rest.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !is_no_value(v))
        .map(str::to_string)
}

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Unified number: 10 digits starting with 7.
pub fn validate_unified_number(value: &str) -> Result<(), ValidationError> {
    if is_no_value(value) {
        return Ok(());
    }
    let value = value.trim();
    if value.is_empty() {
        return Err(error("unified_number_required", "الرقم الموحد مطلوب".to_string()));
    }
    if !DIGITS_REGEX.is_match(value) {
        return Err(error(
            "unified_number_digits",
            "الرقم الموحد يجب أن يحتوي على أرقام فقط".to_string(),
        ));
    }
    if value.len() != 10 {
        return Err(error(
            "unified_number_length",
            format!(
                "الرقم الموحد يجب أن يكون 10 أرقام (الحالي: {} أرقام)",
                value.len()
            ),
        ));
    }
    if !value.starts_with('7') {
        return Err(error(
            "unified_number_prefix",
            "الرقم الموحد يجب أن يبدأ برقم 7".to_string(),
        ));
    }
    Ok(())
}

/// Labor office (Qiwa) subscription: `13-` followed by seven digits.
pub fn validate_labor_subscription(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || is_no_value(value) || LABOR_SUBSCRIPTION_REGEX.is_match(value) {
        return Ok(());
    }

    let message = if !value.starts_with("13") {
        "رقم قوى يجب أن يبدأ ب 13".to_string()
    } else if !value.contains('-') {
        "رقم قوى يجب أن يكون بالصيغة: 13-XXXXXXX (مثال: 13-4084802)".to_string()
    } else {
        match value.split_once('-') {
            Some((_, tail)) if tail.contains('-') => {
                "رقم قوى يجب أن يحتوي على شرطة واحدة فقط: 13-XXXXXXX".to_string()
            }
            Some((_, tail)) => format!(
                "الجزء الثاني من رقم قوى يجب أن يكون 7 أرقام بالضبط (الحالي: {} أرقام)",
                tail.chars().count()
            ),
            None => "الصيغة الصحيحة لرقم قوى: 13-XXXXXXX".to_string(),
        }
    };

    Err(error("labor_subscription_format", message))
}

/// Residence (iqama) number: 10 digits.
pub fn validate_residence_number(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.len() == 10 && DIGITS_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(error(
            "residence_number_format",
            "رقم الإقامة يجب أن يكون 10 أرقام".to_string(),
        ))
    }
}

pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() || is_no_value(value) || PHONE_REGEX.is_match(&compact) {
        Ok(())
    } else {
        Err(error("phone_format", "رقم الجوال غير صالح".to_string()))
    }
}

/// Expiry-threshold day counts: 0 to 3650.
pub fn validate_threshold_days(value: i64) -> Result<(), ValidationError> {
    if (0..=3650).contains(&value) {
        Ok(())
    } else {
        Err(error(
            "threshold_days_range",
            "عدد الأيام يجب أن يكون بين 0 و 3650".to_string(),
        ))
    }
}
