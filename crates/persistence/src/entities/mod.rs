//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod activity_log;
pub mod company;
pub mod employee;
pub mod project;
pub mod saved_search;
pub mod setting;
pub mod user;

pub use activity_log::ActivityLogEntity;
pub use company::{CompanyEntity, CompanyWithCountEntity};
pub use employee::{EmployeeEntity, EmployeeWithCompanyEntity};
pub use project::{ProjectEntity, ProjectWithCountEntity};
pub use saved_search::SavedSearchEntity;
pub use setting::SystemSettingEntity;
pub use user::UserEntity;
