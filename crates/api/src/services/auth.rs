//! Login, token refresh and password changes.

use chrono::Utc;
use domain::models::login_attempt::{LOCKOUT_DURATION_MINUTES_KEY, MAX_LOGIN_ATTEMPTS_KEY};
use domain::models::{
    ActivityAction, EntityType, LoginAttemptKind, LoginPolicy, NewLoginAttempt, User,
};
use domain::services::ActivityLogBuilder;
use persistence::repositories::{
    ActivityLogRepository, LoginAttemptRepository, SettingRepository, UserRepository,
};
use shared::jwt::{extract_user_id, JwtConfig, JwtError, TokenPair};
use shared::password::{check_strength, hash_password, verify_password, PasswordError};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User is disabled")]
    UserDisabled,

    #[error("Too many failed login attempts, locked for {0} minutes")]
    LockedOut(i64),

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("البريد الإلكتروني أو كلمة المرور غير صحيحة".to_string())
            }
            AuthError::UserDisabled => ApiError::Forbidden("الحساب معطل".to_string()),
            AuthError::LockedOut(minutes) => ApiError::Forbidden(format!(
                "تم إيقاف تسجيل الدخول مؤقتاً بسبب تكرار المحاولات الفاشلة، يرجى المحاولة بعد {} دقيقة",
                minutes
            )),
            AuthError::UserNotFound => ApiError::NotFound("المستخدم غير موجود".to_string()),
            AuthError::InvalidRefreshToken => {
                ApiError::Unauthorized("انتهت صلاحية الجلسة، يرجى تسجيل الدخول".to_string())
            }
            AuthError::WrongCurrentPassword => {
                ApiError::validation("كلمة المرور الحالية غير صحيحة")
            }
            AuthError::TokenError(e) => ApiError::from(e),
            AuthError::PasswordError(e) => ApiError::from(e),
            AuthError::DatabaseError(e) => ApiError::from(e),
        }
    }
}

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    activity: ActivityLogRepository,
    attempts: LoginAttemptRepository,
    settings: SettingRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            activity: ActivityLogRepository::new(pool.clone()),
            attempts: LoginAttemptRepository::new(pool.clone()),
            settings: SettingRepository::new(pool),
            jwt,
        }
    }

    /// Lockout policy from system settings, defaults filled in.
    pub async fn login_policy(&self) -> Result<LoginPolicy, AuthError> {
        let max_attempts = self.settings.get_value(MAX_LOGIN_ATTEMPTS_KEY).await?;
        let lockout_minutes = self.settings.get_value(LOCKOUT_DURATION_MINUTES_KEY).await?;
        Ok(LoginPolicy::from_settings(
            max_attempts.as_ref(),
            lockout_minutes.as_ref(),
        ))
    }

    /// Email/password login. Unknown email and wrong password are
    /// indistinguishable to the caller. Once the address has too many
    /// recent failures, every attempt is refused until the window passes,
    /// even with the right password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip_address: Option<String>,
    ) -> Result<LoginResult, AuthError> {
        let email = email.trim().to_lowercase();
        let attempt = |user_id: Option<Uuid>, kind, failure_reason| NewLoginAttempt {
            email: email.clone(),
            user_id,
            kind,
            failure_reason,
            ip_address: ip_address.clone(),
        };

        let policy = self.login_policy().await?;
        let failures = self
            .attempts
            .count_recent_failures(&email, Utc::now() - policy.lockout_window())
            .await?;
        if policy.is_locked(failures) {
            warn!(failures, "Login refused: too many failed attempts");
            self.attempts
                .record(&attempt(None, LoginAttemptKind::Locked, Some("locked_out")))
                .await?;
            return Err(AuthError::LockedOut(policy.lockout_duration_minutes));
        }

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!("Login attempt for unknown email");
                self.attempts
                    .record(&attempt(None, LoginAttemptKind::Failed, Some("unknown_email")))
                    .await?;
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, failures = failures + 1, "Login failed: wrong password");
            self.attempts
                .record(&attempt(Some(user.id), LoginAttemptKind::Failed, Some("wrong_password")))
                .await?;
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            warn!(user_id = %user.id, "Login refused: account disabled");
            self.attempts
                .record(&attempt(Some(user.id), LoginAttemptKind::Failed, Some("disabled")))
                .await?;
            return Err(AuthError::UserDisabled);
        }

        let tokens = self.jwt.issue_pair(user.id, user.role.as_str())?;
        self.users.touch_last_login(user.id).await?;
        self.attempts
            .record(&attempt(Some(user.id), LoginAttemptKind::Success, None))
            .await?;

        self.activity.insert_async(
            ActivityLogBuilder::user_action(user.id, ActivityAction::Login, EntityType::User)
                .on_entity(user.id)
                .with_detail("email", user.email.clone())
                .with_ip(ip_address.clone())
                .build(),
        );

        info!(user_id = %user.id, "User logged in");
        Ok(LoginResult { user, tokens })
    }

    /// Exchanges a refresh token for a new pair. The user must still exist
    /// and be active.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        let user_id = extract_user_id(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        Ok(self.jwt.issue_pair(user.id, user.role.as_str())?)
    }

    /// Changes the caller's own password after checking the current one.
    pub async fn change_own_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(AuthError::WrongCurrentPassword);
        }

        self.set_password(user_id, new_password).await
    }

    /// Replaces a password without checking the old one (admin path).
    pub async fn set_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AuthError> {
        check_strength(new_password)?;
        let hash = hash_password(new_password)?;
        if !self.users.set_password_hash(user_id, &hash).await? {
            return Err(AuthError::UserNotFound);
        }
        info!(user_id = %user_id, "Password updated");
        Ok(())
    }
}
