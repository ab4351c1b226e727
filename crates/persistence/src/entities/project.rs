//! Project entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Project, ProjectStatus, ProjectWithCount};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the projects table.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectWithCountEntity {
    #[sqlx(flatten)]
    pub project: ProjectEntity,
    pub employee_count: i64,
}

impl From<ProjectEntity> for Project {
    fn from(entity: ProjectEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            // The CHECK constraint keeps this parse infallible in practice.
            status: entity.status.parse().unwrap_or(ProjectStatus::Active),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<ProjectWithCountEntity> for ProjectWithCount {
    fn from(entity: ProjectWithCountEntity) -> Self {
        Self {
            project: entity.project.into(),
            employee_count: entity.employee_count,
        }
    }
}
