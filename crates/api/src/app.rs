use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDate;
use domain::services::ThresholdCache;
use persistence::repositories::SettingRepository;
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id,
};
use crate::routes::{
    activity_logs, alerts, auth, companies, dashboard, employees, health, import_export, projects,
    search, settings, users,
};
use crate::services::email::EmailService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub thresholds: ThresholdCache,
    pub email: EmailService,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let jwt = config.security.jwt_config()?;
        let ttl = match config.thresholds.cache_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let thresholds = ThresholdCache::new(Arc::new(SettingRepository::new(pool.clone())), ttl);
        let email = EmailService::new(config.email.clone())?;

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            thresholds,
            email,
        })
    }

    /// Calendar date used for every expiry computation in this request.
    pub fn today(&self) -> NaiveDate {
        shared::dates::today_at_offset(self.config.thresholds.timezone_offset_hours)
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_app(config: Config, pool: PgPool) -> anyhow::Result<Router> {
    let state = AppState::new(config, pool)?;
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let auth_routes = Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/change-password", post(auth::change_password));

    let record_routes = Router::new()
        .route(
            "/api/v1/companies",
            get(companies::list_companies).post(companies::create_company),
        )
        .route("/api/v1/companies/types", get(companies::list_company_types))
        .route(
            "/api/v1/companies/:company_id",
            get(companies::get_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        )
        .route(
            "/api/v1/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/api/v1/employees/:employee_id",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route(
            "/api/v1/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/v1/projects/:project_id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        );

    let admin_routes = Router::new()
        .route("/api/v1/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/v1/users/:user_id",
            get(users::get_user).patch(users::update_user),
        )
        .route("/api/v1/users/:user_id/password", put(users::set_password))
        .route("/api/v1/permissions/schema", get(users::permission_schema))
        .route(
            "/api/v1/settings/thresholds",
            get(settings::get_thresholds).put(settings::update_thresholds),
        )
        .route(
            "/api/v1/settings/security",
            get(settings::get_login_policy).put(settings::update_login_policy),
        )
        .route("/api/v1/activity-logs", get(activity_logs::list_activity_logs));

    let alert_routes = Router::new()
        .route("/api/v1/alerts", get(alerts::list_alerts))
        .route("/api/v1/alerts/stats", get(alerts::alert_stats))
        .route("/api/v1/alerts/read-all", post(alerts::mark_all_read))
        .route(
            "/api/v1/alerts/:alert_id/read",
            post(alerts::mark_read).delete(alerts::mark_unread),
        )
        .route("/api/v1/dashboard/stats", get(dashboard::get_stats));

    let search_routes = Router::new()
        .route("/api/v1/search", post(search::run_search))
        .route(
            "/api/v1/saved-searches",
            get(search::list_saved_searches).post(search::create_saved_search),
        )
        .route(
            "/api/v1/saved-searches/:search_id",
            delete(search::delete_saved_search),
        );

    // Spreadsheet uploads get their own body limit.
    let import_routes = Router::new()
        .route(
            "/api/v1/import/employees",
            post(import_export::import_employees_xlsx),
        )
        .route(
            "/api/v1/import/companies",
            post(import_export::import_companies_xlsx),
        )
        .route(
            "/api/v1/import/template/:kind",
            get(import_export::download_template),
        )
        .layer(DefaultBodyLimit::max(config.import.max_upload_bytes));

    let bulk_routes = Router::new()
        .route(
            "/api/v1/employees/bulk",
            post(import_export::bulk_import_employees),
        )
        .route(
            "/api/v1/companies/bulk",
            post(import_export::bulk_import_companies),
        )
        .route(
            "/api/v1/export/employees",
            get(import_export::export_employees),
        )
        .route(
            "/api/v1/export/companies",
            get(import_export::export_companies),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let json_routes = Router::new()
        .merge(auth_routes)
        .merge(record_routes)
        .merge(admin_routes)
        .merge(alert_routes)
        .merge(search_routes)
        .merge(bulk_routes)
        .layer(DefaultBodyLimit::max(config.server.max_body_size));

    Router::new()
        .merge(public_routes)
        .merge(json_routes)
        .merge(import_routes)
        // bottom layers run first
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.server.cors_origins))
        .with_state(state)
}
