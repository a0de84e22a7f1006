//! Project routes — list and fetch the signed-in user's projects.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::services::project::{self, ProjectRecord};
use crate::services::resolver::ProjectSummary;
use crate::state::AppState;

/// `GET /api/projects` — most recent first.
pub async fn list_projects(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<ProjectSummary>>, StatusCode> {
    project::list_projects(&state.pool, auth.user.id)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %auth.user.id, "project list failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// `GET /api/projects/{id}`
pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectRecord>, StatusCode> {
    project::get_project(&state.pool, auth.user.id, project_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, %project_id, "project fetch failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
