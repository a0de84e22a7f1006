//! Chat helper routes.

use axum::response::Json;

use crate::services::tool_badge::{Badge, ToolInvocation};

/// `POST /api/chat/tool-badges` — labels for a batch of tool invocations.
pub async fn tool_badges(Json(invocations): Json<Vec<ToolInvocation>>) -> Json<Vec<Badge>> {
    Json(invocations.iter().map(ToolInvocation::badge).collect())
}
