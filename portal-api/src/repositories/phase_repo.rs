use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_error::RepositoryError;

const PHASE_COLUMNS: &str = r#"
    id, project_id, parent_phase_id, phase_name, phase_description, estimated_duration,
    phase_order, phase_weight, is_completed, created_at, updated_at
"#;

#[async_trait]
pub trait PhaseRepository {
    async fn phases_by_project(&self, project_id: i32)
        -> Result<Vec<DatabasePhase>, RepositoryError>;
    async fn set_completed(
        &self,
        phase_id: i32,
        is_completed: bool,
    ) -> Result<DatabasePhase, RepositoryError>;
    /// Insert top-level rows and their sub-tasks in one transaction.
    async fn insert_phases(
        &self,
        project_id: i32,
        phases: &[NewDatabasePhase],
    ) -> Result<Vec<DatabasePhase>, RepositoryError>;
    async fn update_phase(
        &self,
        phase_id: i32,
        update: &UpdateDatabasePhase,
    ) -> Result<DatabasePhase, RepositoryError>;
    async fn delete_phases(&self, phase_ids: &[i32]) -> Result<u64, RepositoryError>;
}

pub struct PhaseRepositoryImpl {
    pool: PgPool,
}

impl PhaseRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DatabasePhase {
    pub id: i32,
    pub project_id: i32,
    pub parent_phase_id: Option<i32>,
    pub phase_name: String,
    pub phase_description: Option<String>,
    pub estimated_duration: Option<String>,
    pub phase_order: i32,
    pub phase_weight: f64,
    pub is_completed: bool,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewDatabasePhase {
    pub parent_phase_id: Option<i32>,
    pub phase_name: String,
    pub phase_description: Option<String>,
    pub estimated_duration: Option<String>,
    pub phase_order: i32,
    pub phase_weight: f64,
    pub sub_tasks: Vec<NewDatabasePhase>,
}

/// `None` keeps the stored value. Empty strings are already mapped to
/// `Some(None)` by the caller to clear a nullable column.
#[derive(Debug, Clone, Default)]
pub struct UpdateDatabasePhase {
    pub phase_name: Option<String>,
    pub phase_description: Option<Option<String>>,
    pub estimated_duration: Option<Option<String>>,
    pub phase_order: Option<i32>,
    pub phase_weight: Option<f64>,
}

#[async_trait]
impl PhaseRepository for PhaseRepositoryImpl {
    async fn phases_by_project(
        &self,
        project_id: i32,
    ) -> Result<Vec<DatabasePhase>, RepositoryError> {
        let phases = sqlx::query_as::<_, DatabasePhase>(&format!(
            r#"
            SELECT {PHASE_COLUMNS}
            FROM project_phases
            WHERE project_id = $1
            ORDER BY phase_order, id
            "#
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(phases)
    }

    async fn set_completed(
        &self,
        phase_id: i32,
        is_completed: bool,
    ) -> Result<DatabasePhase, RepositoryError> {
        let phase = sqlx::query_as::<_, DatabasePhase>(&format!(
            r#"
            UPDATE project_phases
            SET is_completed = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PHASE_COLUMNS}
            "#
        ))
        .bind(phase_id)
        .bind(is_completed)
        .fetch_optional(&self.pool)
        .await?;

        phase.ok_or_else(|| RepositoryError::NotFound(format!("phase {phase_id}")))
    }

    async fn insert_phases(
        &self,
        project_id: i32,
        phases: &[NewDatabasePhase],
    ) -> Result<Vec<DatabasePhase>, RepositoryError> {
        let insert = format!(
            r#"
            INSERT INTO project_phases (
                project_id, parent_phase_id, phase_name, phase_description,
                estimated_duration, phase_order, phase_weight, is_completed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE)
            RETURNING {PHASE_COLUMNS}
            "#
        );

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::new();

        for phase in phases {
            let parent = sqlx::query_as::<_, DatabasePhase>(&insert)
                .bind(project_id)
                .bind(phase.parent_phase_id)
                .bind(&phase.phase_name)
                .bind(&phase.phase_description)
                .bind(&phase.estimated_duration)
                .bind(phase.phase_order)
                .bind(phase.phase_weight)
                .fetch_one(&mut *tx)
                .await?;
            let parent_id = parent.id;
            created.push(parent);

            for sub_task in &phase.sub_tasks {
                let child = sqlx::query_as::<_, DatabasePhase>(&insert)
                    .bind(project_id)
                    .bind(parent_id)
                    .bind(&sub_task.phase_name)
                    .bind(&sub_task.phase_description)
                    .bind(&sub_task.estimated_duration)
                    .bind(sub_task.phase_order)
                    .bind(sub_task.phase_weight)
                    .fetch_one(&mut *tx)
                    .await?;
                created.push(child);
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn update_phase(
        &self,
        phase_id: i32,
        update: &UpdateDatabasePhase,
    ) -> Result<DatabasePhase, RepositoryError> {
        let phase = sqlx::query_as::<_, DatabasePhase>(&format!(
            r#"
            UPDATE project_phases
            SET phase_name = COALESCE($2, phase_name),
                phase_description = CASE WHEN $3 THEN $4 ELSE phase_description END,
                estimated_duration = CASE WHEN $5 THEN $6 ELSE estimated_duration END,
                phase_order = COALESCE($7, phase_order),
                phase_weight = COALESCE($8, phase_weight),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PHASE_COLUMNS}
            "#
        ))
        .bind(phase_id)
        .bind(&update.phase_name)
        .bind(update.phase_description.is_some())
        .bind(update.phase_description.clone().flatten())
        .bind(update.estimated_duration.is_some())
        .bind(update.estimated_duration.clone().flatten())
        .bind(update.phase_order)
        .bind(update.phase_weight)
        .fetch_optional(&self.pool)
        .await?;

        phase.ok_or_else(|| RepositoryError::NotFound(format!("phase {phase_id}")))
    }

    async fn delete_phases(&self, phase_ids: &[i32]) -> Result<u64, RepositoryError> {
        // Sub-tasks are removed by the ON DELETE CASCADE on parent_phase_id.
        let result = sqlx::query(
            r#"
            DELETE FROM project_phases
            WHERE id = ANY($1)
            "#,
        )
        .bind(phase_ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
