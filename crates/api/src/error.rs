use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::ThresholdStoreError;
use serde::Serialize;
use shared::jwt::JwtError;
use shared::password::PasswordError;
use thiserror::Error;

pub const GENERIC_ERROR_MESSAGE: &str = "حدث خطأ غير متوقع، يرجى المحاولة مرة أخرى";
const DUPLICATE_MESSAGE: &str = "يوجد سجل بنفس البيانات مسبقاً";
const MISSING_FIELD_MESSAGE: &str = "يرجى تعبئة جميع الحقول المطلوبة";
const REFERENCED_MESSAGE: &str = "لا يمكن تنفيذ العملية لارتباط السجل بسجلات أخرى";
const NOT_FOUND_MESSAGE: &str = "السجل غير موجود";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<ValidationDetail>,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Text a user would see for this error; server-side details stay hidden.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Validation { details, .. } if details.len() > 1 => details
                .iter()
                .map(|d| format!("{}: {}", d.field, d.message))
                .collect::<Vec<_>>()
                .join("، "),
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::Internal(_) | ApiError::ServiceUnavailable(_) => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                (!details.is_empty()).then_some(details),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    GENERIC_ERROR_MESSAGE.to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!(error = %msg, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    GENERIC_ERROR_MESSAGE.to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Arabic message for a unique violation, chosen by constraint name.
fn duplicate_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(c) if c.contains("residence_number") => "رقم الإقامة مسجل مسبقاً لموظف آخر",
        Some(c) if c.contains("unified_number") => "الرقم الموحد مسجل مسبقاً لمؤسسة أخرى",
        Some(c) if c.contains("email") => "البريد الإلكتروني مستخدم مسبقاً",
        Some(c) if c.starts_with("projects_name") => "يوجد مشروع بنفس الاسم",
        _ => DUPLICATE_MESSAGE,
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound(NOT_FOUND_MESSAGE.into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => ApiError::Conflict(duplicate_message(db_err.constraint()).into()),
                Some("23502") => ApiError::Validation {
                    message: MISSING_FIELD_MESSAGE.into(),
                    details: db_err
                        .constraint()
                        .map(|c| {
                            vec![ValidationDetail {
                                field: c.to_string(),
                                message: MISSING_FIELD_MESSAGE.into(),
                            }]
                        })
                        .unwrap_or_default(),
                },
                Some("23503") => ApiError::Conflict(REFERENCED_MESSAGE.into()),
                _ => ApiError::Internal(format!("Database error: {}", db_err)),
            },
            sqlx::Error::PoolTimedOut => ApiError::ServiceUnavailable("Database pool timed out".into()),
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details = Vec::new();
        collect_details(&errors, "", &mut details);
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = match details.as_slice() {
            [single] => single.message.clone(),
            _ => format!("{} حقول غير صالحة", details.len()),
        };

        ApiError::Validation { message, details }
    }
}

fn collect_details(
    errors: &validator::ValidationErrors,
    prefix: &str,
    out: &mut Vec<ValidationDetail>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| ValidationDetail {
                    field: path.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("قيمة غير صالحة ({})", e.code)),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_details(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_details(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

impl From<ThresholdStoreError> for ApiError {
    fn from(err: ThresholdStoreError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort(_) => ApiError::validation(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired => ApiError::Unauthorized("انتهت صلاحية الجلسة".into()),
            JwtError::InvalidToken | JwtError::DecodingError(_) => {
                ApiError::Unauthorized("رمز الدخول غير صالح".into())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
