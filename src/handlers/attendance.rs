use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::{Json, response::IntoResponse};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::models::{AttendanceStatus, MatrixFilter};
use crate::error::RollcallError;
use crate::middleware::{AppJson, CurrentUser};
use crate::router::RollcallState;
use crate::service::{aggregator, report};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Deserialize)]
pub struct MatrixQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Comma-separated lesson ids.
    pub lesson_ids: Option<String>,
    /// Comma-separated student ids.
    pub student_ids: Option<String>,
    pub subgroup_id: Option<i64>,
}

impl MatrixQuery {
    fn into_filter(self) -> Result<MatrixFilter, RollcallError> {
        Ok(MatrixFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            lesson_ids: parse_id_list(self.lesson_ids.as_deref())?,
            student_ids: parse_id_list(self.student_ids.as_deref())?,
            subgroup_id: self.subgroup_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub subgroup_id: Option<i64>,
}

impl ExportQuery {
    fn into_filter(self) -> MatrixFilter {
        MatrixFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            subgroup_id: self.subgroup_id,
            ..MatrixFilter::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    #[serde(default)]
    pub status: String,
    pub note: Option<String>,
}

/// GET /api/attendance/group/{group_id} -> the attendance matrix of an
/// owned group: one row per student, one cell per lesson.
pub async fn matrix(
    State(state): State<RollcallState>,
    user: CurrentUser,
    Path(group_id): Path<i64>,
    Query(query): Query<MatrixQuery>,
) -> Result<impl IntoResponse, RollcallError> {
    if state
        .storage
        .find_owned_group(group_id, user.id)
        .await?
        .is_none()
    {
        return Err(RollcallError::NotFound("group"));
    }

    let filter = query.into_filter()?;
    let matrix = aggregator::attendance_matrix(&state.storage, group_id, &filter).await?;
    Ok(Json(matrix.students))
}

/// PUT /api/attendance/{lesson_id}/students/{student_id} -> records or
/// overwrites one mark. The lesson must belong to the caller and the
/// student to the lesson's group.
pub async fn upsert_mark(
    State(state): State<RollcallState>,
    user: CurrentUser,
    Path((lesson_id, student_id)): Path<(i64, i64)>,
    AppJson(body): AppJson<MarkRequest>,
) -> Result<impl IntoResponse, RollcallError> {
    let Some(status) = AttendanceStatus::from_symbol(body.status.trim()) else {
        return Err(RollcallError::validation(format!(
            "invalid status: {}",
            body.status
        )));
    };

    let Some(lesson) = state.storage.find_owned_lesson(lesson_id, user.id).await? else {
        return Err(RollcallError::NotFound("lesson"));
    };
    if state
        .storage
        .find_student_in_group(student_id, lesson.group_id)
        .await?
        .is_none()
    {
        return Err(RollcallError::NotFound("student"));
    }

    let note = body.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let record = state
        .storage
        .upsert_mark(student_id, lesson_id, status, note)
        .await?;
    Ok(Json(record))
}

/// GET /api/attendance/export/csv/{group_id} -> the matrix flattened
/// into a UTF-8 CSV download.
pub async fn export_csv(
    State(state): State<RollcallState>,
    user: CurrentUser,
    Path(group_id): Path<i64>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, RollcallError> {
    if state
        .storage
        .find_owned_group(group_id, user.id)
        .await?
        .is_none()
    {
        return Err(RollcallError::NotFound("group"));
    }

    let filter = query.into_filter();
    let matrix = aggregator::attendance_matrix(&state.storage, group_id, &filter).await?;
    let bytes = report::render_csv(&matrix)?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"посещаемость.csv\"".to_string(),
        ),
    ];
    Ok((headers, bytes))
}

/// GET /api/attendance/export/xlsx/{group_id} -> the journal-shaped
/// workbook download.
pub async fn export_xlsx(
    State(state): State<RollcallState>,
    user: CurrentUser,
    Path(group_id): Path<i64>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, RollcallError> {
    if state
        .storage
        .find_owned_group(group_id, user.id)
        .await?
        .is_none()
    {
        return Err(RollcallError::NotFound("group"));
    }

    let filter = query.into_filter();
    let matrix = aggregator::attendance_matrix(&state.storage, group_id, &filter).await?;
    let bytes = report::render_xlsx(group_id, &matrix)?;

    let filename = format!("посещаемость_группа_{group_id}.xlsx");
    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename*=UTF-8''{}", urlencoding::encode(&filename)),
        ),
    ];
    Ok((headers, bytes))
}

/// Parse `?lesson_ids=1,2,3` style lists; a malformed entry rejects the
/// whole request instead of silently matching nothing.
fn parse_id_list(raw: Option<&str>) -> Result<Option<Vec<i64>>, RollcallError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let mut ids = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id = part
            .parse::<i64>()
            .map_err(|_| RollcallError::validation(format!("invalid id list entry: {part}")))?;
        ids.push(id);
    }
    Ok(Some(ids))
}
