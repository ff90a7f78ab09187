use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::db::models::GroupStats;
use crate::error::RollcallError;
use crate::middleware::CurrentUser;
use crate::router::RollcallState;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub subgroup_id: Option<i64>,
}

/// GET /api/stats/group/{group_id} -> per-status totals over recorded
/// marks of an owned group, plus the roster size.
pub async fn group_stats(
    State(state): State<RollcallState>,
    user: CurrentUser,
    Path(group_id): Path<i64>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<GroupStats>, RollcallError> {
    if state
        .storage
        .find_owned_group(group_id, user.id)
        .await?
        .is_none()
    {
        return Err(RollcallError::NotFound("group"));
    }

    let stats = state.storage.group_stats(group_id, query.subgroup_id).await?;
    Ok(Json(stats))
}
