//! Project repository for database operations.

use domain::models::{Project, ProjectInput, ProjectWithCount};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ProjectEntity, ProjectWithCountEntity};
use crate::metrics::QueryTimer;

/// Repository for project database operations.
#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All projects with the number of assigned employees.
    pub async fn list_with_counts(&self) -> Result<Vec<ProjectWithCount>, sqlx::Error> {
        let timer = QueryTimer::new("list_projects");
        let rows = sqlx::query_as::<_, ProjectWithCountEntity>(
            r#"
            SELECT p.*,
                   (SELECT COUNT(*) FROM employees e WHERE e.project_id = p.id) AS employee_count
            FROM projects p
            ORDER BY p.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(rows?.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
        let timer = QueryTimer::new("find_project_by_id");
        let row = sqlx::query_as::<_, ProjectEntity>(r#"SELECT * FROM projects WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(row?.map(Into::into))
    }

    pub async fn create(&self, input: &ProjectInput) -> Result<Project, sqlx::Error> {
        let timer = QueryTimer::new("create_project");
        let entity = sqlx::query_as::<_, ProjectEntity>(
            r#"
            INSERT INTO projects (name, description, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.status.as_str())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(entity?.into())
    }

    /// Renames propagate to the denormalized `employees.project_name`.
    pub async fn update(
        &self,
        id: Uuid,
        input: &ProjectInput,
    ) -> Result<Option<Project>, sqlx::Error> {
        let timer = QueryTimer::new("update_project");
        let mut tx = self.pool.begin().await?;

        let entity = sqlx::query_as::<_, ProjectEntity>(
            r#"
            UPDATE projects
            SET name = $2, description = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.status.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(ref project) = entity {
            sqlx::query(
                r#"
                UPDATE employees SET project_name = $2, updated_at = NOW()
                WHERE project_id = $1 AND project_name IS DISTINCT FROM $2
                "#,
            )
            .bind(id)
            .bind(&project.name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(entity.map(Into::into))
    }

    /// Deletes a project, detaching its employees. Returns the number of
    /// detached employees, or `None` if the project did not exist.
    pub async fn delete(&self, id: Uuid) -> Result<Option<u64>, sqlx::Error> {
        let timer = QueryTimer::new("delete_project");
        let mut tx = self.pool.begin().await?;

        let detached = sqlx::query(
            r#"
            UPDATE employees
            SET project_id = NULL, project_name = NULL, updated_at = NOW()
            WHERE project_id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query(r#"DELETE FROM projects WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        tx.commit().await?;
        timer.record();
        Ok(Some(detached))
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM projects"#)
            .fetch_one(&self.pool)
            .await
    }
}
