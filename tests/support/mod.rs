#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use rollcall::db::{self, JournalStorage};
use rollcall::router::{RollcallState, rollcall_router};
use rollcall::service::token::TokenService;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

/// Router plus direct handles to the storage and token service, backed
/// by a throwaway SQLite file that is removed on drop.
pub struct TestApp {
    pub router: Router,
    pub storage: JournalStorage,
    pub tokens: TokenService,
    db_path: PathBuf,
}

pub async fn spawn_app(tag: &str) -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut db_path = std::env::temp_dir();
    db_path.push(format!(
        "rollcall-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let database_url = format!("sqlite:{}", db_path.display());
    let pool = db::connect(&database_url)
        .await
        .expect("failed to open test database");
    let storage = JournalStorage::new(pool);
    storage.init_schema().await.expect("failed to init schema");

    let tokens = TokenService::new("test-secret", 24);
    let state = RollcallState::new(storage.clone(), tokens.clone());

    TestApp {
        router: rollcall_router(state),
        storage,
        tokens,
        db_path,
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let base = self.db_path.display().to_string();
        for path in [base.clone(), format!("{base}-wal"), format!("{base}-shm")] {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl TestApp {
    /// Fire a request and parse the response as JSON (`Null` for an
    /// empty body).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send(method, uri, token, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body was not JSON")
        };
        (status, value)
    }

    /// Fire a request and hand back the raw response, for asserting on
    /// headers and non-JSON bodies.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }

    /// Register the curator through the API and return a usable token.
    pub async fn register_curator(&self) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"email": "curator@example.com", "password": "secret123"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
        body["token"]
            .as_str()
            .expect("register response missing token")
            .to_string()
    }

    /// Insert a second user directly; registration only ever admits one
    /// curator, but ownership tests need a rival account.
    pub async fn seed_user(&self, email: &str) -> (i64, String) {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO users (email, password, role) VALUES (?, 'not-a-real-hash', 'curator') RETURNING id",
        )
        .bind(email)
        .fetch_one(self.storage.pool())
        .await
        .expect("failed to seed user");
        let token = self.tokens.issue(row.0).expect("failed to issue token");
        (row.0, token)
    }

    pub async fn create_group(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .request("POST", "/api/groups", Some(token), Some(json!({"name": name})))
            .await;
        assert_eq!(status, StatusCode::CREATED, "group creation failed: {body}");
        body["id"].as_i64().expect("group response missing id")
    }

    pub async fn add_students(&self, token: &str, group_id: i64, students: Value) -> Value {
        let (status, body) = self
            .request(
                "POST",
                &format!("/api/groups/{group_id}/students"),
                Some(token),
                Some(students),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "bulk add failed: {body}");
        body
    }

    /// Roster ids in list order.
    pub async fn student_ids(&self, token: &str, group_id: i64) -> Vec<i64> {
        let (status, body) = self
            .request(
                "GET",
                &format!("/api/groups/{group_id}/students"),
                Some(token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "roster listing failed: {body}");
        body.as_array()
            .expect("roster response was not an array")
            .iter()
            .map(|s| s["id"].as_i64().expect("student missing id"))
            .collect()
    }

    pub async fn create_lesson(
        &self,
        token: &str,
        group_id: i64,
        date: &str,
        lesson_num: i64,
        title: &str,
    ) -> i64 {
        let (status, body) = self
            .request(
                "POST",
                "/api/lessons",
                Some(token),
                Some(json!({
                    "date": date,
                    "lesson_num": lesson_num,
                    "title": title,
                    "group_id": group_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "lesson creation failed: {body}");
        body["id"].as_i64().expect("lesson response missing id")
    }

    pub async fn put_mark(
        &self,
        token: &str,
        lesson_id: i64,
        student_id: i64,
        status_symbol: &str,
        note: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut payload = json!({"status": status_symbol});
        if let Some(note) = note {
            payload["note"] = json!(note);
        }
        self.request(
            "PUT",
            &format!("/api/attendance/{lesson_id}/students/{student_id}"),
            Some(token),
            Some(payload),
        )
        .await
    }

    pub async fn matrix(&self, token: &str, group_id: i64, query: &str) -> Value {
        let uri = if query.is_empty() {
            format!("/api/attendance/group/{group_id}")
        } else {
            format!("/api/attendance/group/{group_id}?{query}")
        };
        let (status, body) = self.request("GET", &uri, Some(token), None).await;
        assert_eq!(status, StatusCode::OK, "matrix request failed: {body}");
        body
    }
}
