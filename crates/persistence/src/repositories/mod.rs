//! Repository implementations for database operations.

pub mod activity_log;
pub mod company;
pub mod dashboard;
pub mod employee;
pub mod login_attempt;
pub mod project;
pub mod read_alert;
pub mod saved_search;
pub mod setting;
pub mod user;

pub use activity_log::ActivityLogRepository;
pub use company::{CompanyListFilter, CompanyRepository};
pub use dashboard::{DashboardRepository, DashboardTotals};
pub use employee::{EmployeeListFilter, EmployeeRepository};
pub use login_attempt::LoginAttemptRepository;
pub use project::ProjectRepository;
pub use read_alert::ReadAlertRepository;
pub use saved_search::SavedSearchRepository;
pub use setting::SettingRepository;
pub use user::{NewUser, UserRepository};
