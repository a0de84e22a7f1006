//! Project persistence.
//!
//! DESIGN
//! ======
//! A project owns a chat history and a serialized virtual file system, both
//! stored as JSONB. Listings are most-recent-first so callers can take the
//! head of the list as "the project the user was last working on".

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use super::resolver::{AuthSession, ChatMessage, FileSystemData, NewProject, ProjectStore, ProjectSummary};

/// Full project row including its content.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRecord {
    #[serde(flatten)]
    pub summary: ProjectSummary,
    pub messages: Vec<ChatMessage>,
    pub data: FileSystemData,
}

fn summary_from_row(row: &PgRow) -> ProjectSummary {
    ProjectSummary {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get::<OffsetDateTime, _>("created_at"),
        updated_at: row.get::<OffsetDateTime, _>("updated_at"),
    }
}

/// List a user's projects, most recently updated first.
pub async fn list_projects(pool: &PgPool, user_id: Uuid) -> Result<Vec<ProjectSummary>, ServiceError> {
    let rows = sqlx::query(
        r"SELECT id, name, created_at, updated_at
          FROM projects
          WHERE user_id = $1
          ORDER BY updated_at DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(summary_from_row).collect())
}

/// Insert a project owned by `user_id`.
pub async fn create_project(pool: &PgPool, user_id: Uuid, project: NewProject) -> Result<ProjectSummary, ServiceError> {
    let row = sqlx::query(
        r"INSERT INTO projects (user_id, name, messages, data)
          VALUES ($1, $2, $3, $4)
          RETURNING id, name, created_at, updated_at",
    )
    .bind(user_id)
    .bind(&project.name)
    .bind(Json(&project.messages))
    .bind(Json(&project.data))
    .fetch_one(pool)
    .await?;

    let summary = summary_from_row(&row);
    info!(%user_id, project_id = %summary.id, name = %summary.name, "project created");
    Ok(summary)
}

/// Fetch one project if it belongs to `user_id`.
pub async fn get_project(pool: &PgPool, user_id: Uuid, project_id: Uuid) -> Result<Option<ProjectRecord>, ServiceError> {
    let row = sqlx::query(
        r"SELECT id, name, created_at, updated_at, messages, data
          FROM projects
          WHERE id = $1 AND user_id = $2",
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| {
        let Json(messages) = row.get::<Json<Vec<ChatMessage>>, _>("messages");
        let Json(data) = row.get::<Json<FileSystemData>, _>("data");
        ProjectRecord { summary: summary_from_row(&row), messages, data }
    }))
}

/// [`ProjectStore`] scoped to the session's user.
#[derive(Debug, Clone)]
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProjectStore for PgProjectStore {
    async fn list_projects(&self, session: &AuthSession) -> Result<Vec<ProjectSummary>, ServiceError> {
        list_projects(&self.pool, session.user_id).await
    }

    async fn create_project(&self, session: &AuthSession, project: NewProject) -> Result<ProjectSummary, ServiceError> {
        create_project(&self.pool, session.user_id, project).await
    }
}

#[cfg(test)]
#[path = "project_test.rs"]
mod tests;
