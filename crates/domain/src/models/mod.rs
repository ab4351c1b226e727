//! Domain models.

pub mod activity_log;
pub mod alert;
pub mod company;
pub mod dashboard;
pub mod employee;
pub mod expiry;
pub mod import;
pub mod login_attempt;
pub mod pagination;
pub mod permission;
pub mod project;
pub mod saved_search;
pub mod search;
pub mod setting;
pub mod user;

pub use activity_log::{ActivityAction, ActivityLog, EntityType, NewActivityLog};
pub use alert::{AlertPriority, AlertStats, AlertSubject, ExpiryAlert};
pub use company::{Company, CompanyInput, CompanyResponse};
pub use employee::{Employee, EmployeeInput, EmployeeResponse};
pub use expiry::{
    classify, days_between, DocumentOwner, DocumentStatus, DocumentType, ExpiryStatus,
    ExpiryThresholds, HasDocuments,
};
pub use login_attempt::{LoginAttemptKind, LoginPolicy, NewLoginAttempt};
pub use pagination::{PageRequest, Paginated, Pagination};
pub use permission::{PermissionAction, PermissionMatrix, PermissionSection};
pub use project::{Project, ProjectInput, ProjectStatus, ProjectWithCount};
pub use setting::{SystemSetting, ThresholdSettings};
pub use user::{Role, User, UserResponse};
