//! Mails urgent and high expiry alerts to the administrator.

use chrono::{Duration, Utc};
use domain::models::setting::DIGEST_LAST_SENT_KEY;
use domain::services::alerts::{company_alerts, digest_candidates, employee_alerts, sort_alerts};
use domain::services::ThresholdCache;
use persistence::repositories::{CompanyRepository, EmployeeRepository, SettingRepository};
use sqlx::PgPool;
use tracing::{debug, info};

use super::scheduler::{Job, JobFrequency};
use crate::config::DigestConfig;
use crate::middleware::record_digest_sent;
use crate::services::digest::{render, unsent, SentLog};
use crate::services::EmailService;

pub struct ExpiryDigestJob {
    pool: PgPool,
    thresholds: ThresholdCache,
    email: EmailService,
    config: DigestConfig,
    timezone_offset_hours: i32,
}

impl ExpiryDigestJob {
    pub fn new(
        pool: PgPool,
        thresholds: ThresholdCache,
        email: EmailService,
        config: DigestConfig,
        timezone_offset_hours: i32,
    ) -> Self {
        Self {
            pool,
            thresholds,
            email,
            config,
            timezone_offset_hours,
        }
    }

    /// Number of alerts mailed; zero when there was nothing new.
    pub async fn run_once(&self) -> Result<usize, String> {
        let recipient = self.config.admin_email.trim();
        if !self.config.enabled || recipient.is_empty() {
            debug!("Expiry digest disabled or no recipient configured");
            return Ok(0);
        }

        let thresholds = self
            .thresholds
            .get()
            .await
            .map_err(|e| format!("Failed to load thresholds: {}", e))?;
        let employees = EmployeeRepository::new(self.pool.clone())
            .list_all_with_company_name()
            .await
            .map_err(|e| format!("Failed to load employees: {}", e))?;
        let companies = CompanyRepository::new(self.pool.clone())
            .list_all()
            .await
            .map_err(|e| format!("Failed to load companies: {}", e))?;

        let today = shared::dates::today_at_offset(self.timezone_offset_hours);
        let mut alerts = employee_alerts(&employees, &thresholds, today);
        alerts.extend(company_alerts(&companies, &thresholds, today));
        sort_alerts(&mut alerts);

        let settings = SettingRepository::new(self.pool.clone());
        let stored = settings
            .get_value(DIGEST_LAST_SENT_KEY)
            .await
            .map_err(|e| format!("Failed to load digest history: {}", e))?;
        let mut sent = SentLog::from_json(stored.as_ref());

        let now = Utc::now();
        let fresh = unsent(
            digest_candidates(&alerts),
            &sent,
            now,
            Duration::hours(self.config.resend_after_hours),
        );
        if fresh.is_empty() {
            info!("No new urgent or high alerts for the digest");
            return Ok(0);
        }

        self.email
            .send(render(recipient, &fresh, today))
            .await
            .map_err(|e| format!("Failed to send digest: {}", e))?;

        sent.mark_sent(fresh.iter().map(|a| a.id.as_str()), now);
        sent.prune(now, Duration::days(self.config.retention_days));
        settings
            .upsert(DIGEST_LAST_SENT_KEY, &sent.to_json(), None)
            .await
            .map_err(|e| format!("Failed to store digest history: {}", e))?;

        record_digest_sent(fresh.len());
        info!(alerts = fresh.len(), tracked = sent.len(), "Expiry digest sent");
        Ok(fresh.len())
    }
}

#[async_trait::async_trait]
impl Job for ExpiryDigestJob {
    fn name(&self) -> &'static str {
        "expiry_digest"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.config.interval_minutes.max(1))
    }

    async fn execute(&self) -> Result<(), String> {
        self.run_once().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailConfig;
    use std::sync::Arc;

    fn job(config: DigestConfig) -> ExpiryDigestJob {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let thresholds =
            ThresholdCache::new(Arc::new(SettingRepository::new(pool.clone())), None);
        let email = EmailService::new(EmailConfig::default()).unwrap();
        ExpiryDigestJob::new(pool, thresholds, email, config, 3)
    }

    #[tokio::test]
    async fn test_disabled_digest_is_a_no_op() {
        let sent = job(DigestConfig::default()).run_once().await.unwrap();
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn test_missing_recipient_is_a_no_op() {
        let config = DigestConfig {
            enabled: true,
            ..DigestConfig::default()
        };
        assert_eq!(job(config).run_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_frequency_follows_config() {
        let config = DigestConfig {
            interval_minutes: 90,
            ..DigestConfig::default()
        };
        assert_eq!(job(config).frequency().duration().as_secs(), 90 * 60);
    }
}
