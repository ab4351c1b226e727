use serde::Deserialize;
use shared::jwt::{JwtConfig, JwtError};
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub digest: DigestConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub admin: AdminBootstrapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// JSON body limit. Spreadsheet uploads use `import.max_upload_bytes`.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Allowed CORS origins; empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Token signing. Either an RSA PEM pair (RS256) or a shared secret (HS256);
/// the PEM pair wins when both are set.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub jwt_private_key: String,

    #[serde(default)]
    pub jwt_public_key: String,

    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,

    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: i64,

    /// Clock skew tolerance when validating `exp`.
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

impl SecurityConfig {
    pub fn jwt_config(&self) -> Result<JwtConfig, JwtError> {
        if !self.jwt_private_key.is_empty() && !self.jwt_public_key.is_empty() {
            JwtConfig::from_rsa_pem(
                &self.jwt_private_key,
                &self.jwt_public_key,
                self.access_token_expiry_secs,
                self.refresh_token_expiry_secs,
                self.leeway_secs,
            )
        } else {
            JwtConfig::from_secret(
                &self.jwt_secret,
                self.access_token_expiry_secs,
                self.refresh_token_expiry_secs,
                self.leeway_secs,
            )
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdsConfig {
    /// Seconds a loaded threshold blob stays fresh; 0 keeps it until the
    /// next settings save.
    #[serde(default = "default_threshold_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// UTC offset used to decide what "today" is for expiry arithmetic.
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset_hours: i32,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_threshold_cache_ttl(),
            timezone_offset_hours: default_timezone_offset(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_digest_interval")]
    pub interval_minutes: u64,

    /// Recipient of the daily digest.
    #[serde(default)]
    pub admin_email: String,

    /// Alerts mailed within this window are not repeated.
    #[serde(default = "default_digest_resend_hours")]
    pub resend_after_hours: i64,

    /// Sent-alert bookkeeping older than this is pruned.
    #[serde(default = "default_digest_retention_days")]
    pub retention_days: i64,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: default_digest_interval(),
            admin_email: String::new(),
            resend_after_hours: default_digest_resend_hours(),
            retention_days: default_digest_retention_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,

    /// `console` (log only) or `resend`.
    #[serde(default = "default_email_provider")]
    pub provider: String,

    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    #[serde(default)]
    pub resend_api_key: String,

    #[serde(default = "default_resend_api_url")]
    pub resend_api_url: String,

    #[serde(default = "default_email_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            resend_api_key: String::new(),
            resend_api_url: default_resend_api_url(),
            timeout_secs: default_email_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_import_max_rows")]
    pub max_rows: usize,

    #[serde(default = "default_import_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_rows: default_import_max_rows(),
            max_upload_bytes: default_import_max_upload(),
        }
    }
}

/// First administrator, created on startup when no admin exists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminBootstrapConfig {
    #[serde(default)]
    pub bootstrap_email: String,

    #[serde(default)]
    pub bootstrap_password: String,

    #[serde(default)]
    pub bootstrap_full_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    2 * 1024 * 1024
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_access_token_expiry() -> i64 {
    3600
}
fn default_refresh_token_expiry() -> i64 {
    7 * 86400
}
fn default_jwt_leeway() -> u64 {
    shared::jwt::DEFAULT_LEEWAY_SECS
}
fn default_threshold_cache_ttl() -> u64 {
    300
}
fn default_timezone_offset() -> i32 {
    3 // Asia/Riyadh
}

/// Upper bounds keep the digest windows well inside chrono's duration range.
const MAX_DIGEST_RESEND_HOURS: i64 = 24 * 365;
const MAX_DIGEST_RETENTION_DAYS: i64 = 3650;

fn default_digest_interval() -> u64 {
    24 * 60
}
fn default_digest_resend_hours() -> i64 {
    24
}
fn default_digest_retention_days() -> i64 {
    7
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_sender_email() -> String {
    "alerts@saw-tracker.local".to_string()
}
fn default_sender_name() -> String {
    "نظام تتبع المستندات".to_string()
}
fn default_resend_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}
fn default_email_timeout() -> u64 {
    10
}
fn default_import_max_rows() -> usize {
    domain::models::import::MAX_BULK_IMPORT_ROWS
}
fn default_import_max_upload() -> usize {
    10 * 1024 * 1024
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml
    /// 2. config/local.toml (optional, not in git)
    /// 3. Environment variables with the SAW__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("SAW")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Builds a config from embedded defaults plus overrides, without
    /// touching the file system. Used by unit and integration tests.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = ""

            [logging]
            level = "info"
            format = "json"

            [security]
            jwt_secret = "test-secret-that-is-at-least-32-bytes-long"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "SAW__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if let Err(e) = self.security.jwt_config() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "security: {} (set SAW__SECURITY__JWT_PRIVATE_KEY/JWT_PUBLIC_KEY or JWT_SECRET)",
                e
            )));
        }

        if !(-12..=14).contains(&self.thresholds.timezone_offset_hours) {
            return Err(ConfigValidationError::InvalidValue(
                "thresholds.timezone_offset_hours must be between -12 and 14".to_string(),
            ));
        }

        if !matches!(self.email.provider.as_str(), "console" | "resend") {
            return Err(ConfigValidationError::InvalidValue(format!(
                "Unknown email provider: {}",
                self.email.provider
            )));
        }

        if self.email.enabled && self.email.provider == "resend" && self.email.resend_api_key.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "email.resend_api_key is required for the resend provider".to_string(),
            ));
        }

        if self.digest.enabled {
            if self.digest.admin_email.is_empty() {
                return Err(ConfigValidationError::MissingRequired(
                    "digest.admin_email is required when the digest is enabled".to_string(),
                ));
            }
            if self.digest.interval_minutes == 0 {
                return Err(ConfigValidationError::InvalidValue(
                    "digest.interval_minutes must be positive".to_string(),
                ));
            }
        }

        if !(1..=MAX_DIGEST_RESEND_HOURS).contains(&self.digest.resend_after_hours) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "digest.resend_after_hours must be between 1 and {}",
                MAX_DIGEST_RESEND_HOURS
            )));
        }

        if !(1..=MAX_DIGEST_RETENTION_DAYS).contains(&self.digest.retention_days) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "digest.retention_days must be between 1 and {}",
                MAX_DIGEST_RETENTION_DAYS
            )));
        }

        if self.import.max_rows == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "import.max_rows must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
