use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::sqlite::JournalStorage;
use crate::handlers::{attendance, auth, groups, lessons, stats};
use crate::service::token::TokenService;

#[derive(Clone)]
pub struct RollcallState {
    pub storage: JournalStorage,
    pub tokens: TokenService,
}

impl RollcallState {
    pub fn new(storage: JournalStorage, tokens: TokenService) -> Self {
        Self { storage, tokens }
    }
}

/// Assemble the API router. Static assets are mounted by the binary so
/// tests can drive the API without touching the filesystem.
pub fn rollcall_router(state: RollcallState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/groups", get(groups::list_groups).post(groups::create_group))
        .route(
            "/api/groups/{group_id}/students",
            get(groups::list_students).post(groups::add_students),
        )
        .route(
            "/api/lessons",
            get(lessons::list_lessons).post(lessons::create_lesson),
        )
        .route("/api/attendance/group/{group_id}", get(attendance::matrix))
        .route(
            "/api/attendance/{lesson_id}/students/{student_id}",
            put(attendance::upsert_mark),
        )
        .route(
            "/api/attendance/export/csv/{group_id}",
            get(attendance::export_csv),
        )
        .route(
            "/api/attendance/export/xlsx/{group_id}",
            get(attendance::export_xlsx),
        )
        .route("/api/stats/group/{group_id}", get(stats::group_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
