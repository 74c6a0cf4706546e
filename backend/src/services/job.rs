//! Job master data service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::Job;

use crate::error::{AppError, AppResult};

/// Job service for managing work-site records
#[derive(Clone)]
pub struct JobService {
    db: PgPool,
}

/// Input for creating a job
#[derive(Debug, Deserialize)]
pub struct CreateJobInput {
    pub code: String,
    pub description: String,
    pub client_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    code: String,
    description: String,
    client_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            description: row.description,
            client_name: row.client_name,
            created_at: row.created_at,
        }
    }
}

impl JobService {
    /// Create a new JobService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a job
    pub async fn create_job(&self, input: CreateJobInput) -> AppResult<Job> {
        let code = input.code.trim();
        if code.is_empty() {
            return Err(AppError::Validation {
                field: "code".to_string(),
                message: "Job code cannot be empty".to_string(),
            });
        }

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM jobs WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.db)
                .await?;
        if exists {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }

        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (code, description, client_name)
            VALUES ($1, $2, $3)
            RETURNING id, code, description, client_name, created_at
            "#,
        )
        .bind(code)
        .bind(input.description.trim())
        .bind(&input.client_name)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a job by id
    pub async fn get_job(&self, job_id: Uuid) -> AppResult<Job> {
        let row = sqlx::query_as::<_, JobRow>(
            "SELECT id, code, description, client_name, created_at FROM jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Job".to_string()))?;

        Ok(row.into())
    }

    /// List all jobs ordered by code
    pub async fn list_jobs(&self) -> AppResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT id, code, description, client_name, created_at FROM jobs ORDER BY code",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Job::from).collect())
    }
}
