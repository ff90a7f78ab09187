use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::db::models::NewLesson;
use crate::error::RollcallError;
use crate::middleware::{AppJson, CurrentUser};
use crate::router::RollcallState;

#[derive(Debug, Deserialize)]
pub struct CreateLessonRequest {
    pub date: Option<NaiveDate>,
    pub lesson_num: Option<i64>,
    pub title: Option<String>,
    pub group_id: Option<i64>,
    pub subgroup_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LessonsQuery {
    pub id: Option<i64>,
    pub group_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub subgroup_id: Option<i64>,
}

/// POST /api/lessons -> creates a lesson in a group owned by the caller.
pub async fn create_lesson(
    State(state): State<RollcallState>,
    user: CurrentUser,
    AppJson(body): AppJson<CreateLessonRequest>,
) -> Result<impl IntoResponse, RollcallError> {
    let title = body.title.as_deref().map(str::trim).unwrap_or_default();
    let (Some(date), Some(lesson_num), Some(group_id)) = (body.date, body.lesson_num, body.group_id)
    else {
        return Err(RollcallError::validation(
            "date, lesson_num, title and group_id are required",
        ));
    };
    if title.is_empty() {
        return Err(RollcallError::validation(
            "date, lesson_num, title and group_id are required",
        ));
    }

    if state
        .storage
        .find_owned_group(group_id, user.id)
        .await?
        .is_none()
    {
        return Err(RollcallError::NotFound("group"));
    }

    let lesson = state
        .storage
        .create_lesson(&NewLesson {
            date,
            lesson_num,
            title: title.to_string(),
            group_id,
            subgroup_id: body.subgroup_id,
        })
        .await?;
    info!(lesson_id = lesson.id, group_id, "lesson created");
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// GET /api/lessons -> with `?id=` a single owned lesson (kept as a
/// one-element array), otherwise the lessons of `?group_id=` joined
/// with the group name, oldest first.
pub async fn list_lessons(
    State(state): State<RollcallState>,
    user: CurrentUser,
    Query(query): Query<LessonsQuery>,
) -> Result<Response, RollcallError> {
    if let Some(lesson_id) = query.id {
        let Some(lesson) = state.storage.find_owned_lesson(lesson_id, user.id).await? else {
            return Err(RollcallError::NotFound("lesson"));
        };
        return Ok(Json(vec![lesson]).into_response());
    }

    let Some(group_id) = query.group_id else {
        return Err(RollcallError::validation("group_id is required"));
    };
    if state
        .storage
        .find_owned_group(group_id, user.id)
        .await?
        .is_none()
    {
        return Err(RollcallError::NotFound("group"));
    }

    let lessons = state
        .storage
        .list_lessons(group_id, query.date_from, query.date_to, query.subgroup_id)
        .await?;
    Ok(Json(lessons).into_response())
}
