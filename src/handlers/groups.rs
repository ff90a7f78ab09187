use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::db::models::{Group, NewStudent, Student};
use crate::error::RollcallError;
use crate::middleware::{AppJson, CurrentUser};
use crate::router::RollcallState;

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    pub subgroup_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BulkAddResponse {
    pub message: String,
}

/// GET /api/groups -> groups of the authenticated curator, newest first.
pub async fn list_groups(
    State(state): State<RollcallState>,
    user: CurrentUser,
) -> Result<Json<Vec<Group>>, RollcallError> {
    let groups = state.storage.list_groups(user.id).await?;
    Ok(Json(groups))
}

/// POST /api/groups -> creates a group owned by the caller.
pub async fn create_group(
    State(state): State<RollcallState>,
    user: CurrentUser,
    AppJson(body): AppJson<CreateGroupRequest>,
) -> Result<impl IntoResponse, RollcallError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(RollcallError::validation("group name is required"));
    }
    let description = body
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let group = state
        .storage
        .create_group(name, description, user.id)
        .await?;
    info!(group_id = group.id, "group created");
    Ok((StatusCode::CREATED, Json(group)))
}

/// POST /api/groups/{group_id}/students -> bulk-adds students to an
/// owned group. Entries with a blank name are skipped, and the reported
/// count covers rows actually inserted.
pub async fn add_students(
    State(state): State<RollcallState>,
    user: CurrentUser,
    Path(group_id): Path<i64>,
    AppJson(body): AppJson<Value>,
) -> Result<impl IntoResponse, RollcallError> {
    let entries: Vec<NewStudent> = serde_json::from_value(body)
        .map_err(|_| RollcallError::validation("request body must be an array of students"))?;

    if state
        .storage
        .find_owned_group(group_id, user.id)
        .await?
        .is_none()
    {
        return Err(RollcallError::NotFound("group"));
    }

    let inserted = state.storage.add_students(group_id, &entries).await?;
    info!(group_id, inserted, "students added");
    Ok((
        StatusCode::CREATED,
        Json(BulkAddResponse {
            message: format!("Added {inserted} students"),
        }),
    ))
}

/// GET /api/groups/{group_id}/students -> roster of an owned group,
/// optionally narrowed with `?subgroup_id=`.
pub async fn list_students(
    State(state): State<RollcallState>,
    user: CurrentUser,
    Path(group_id): Path<i64>,
    Query(query): Query<RosterQuery>,
) -> Result<Json<Vec<Student>>, RollcallError> {
    if state
        .storage
        .find_owned_group(group_id, user.id)
        .await?
        .is_none()
    {
        return Err(RollcallError::NotFound("group"));
    }

    let students = state
        .storage
        .list_students(group_id, query.subgroup_id)
        .await?;
    Ok(Json(students))
}
