mod support;

use axum::http::StatusCode;
use serde_json::json;
use support::spawn_app;

#[tokio::test]
async fn create_lesson_validates_required_fields() {
    let app = spawn_app("lessons-required").await;
    let token = app.register_curator().await;
    let group_id = app.create_group(&token, "ИУ5-31Б").await;

    for payload in [
        json!({}),
        json!({"date": "2024-05-17", "lesson_num": 1, "group_id": group_id}),
        json!({"date": "2024-05-17", "lesson_num": 1, "title": "  ", "group_id": group_id}),
        json!({"date": "2024-05-17", "title": "Интегралы", "group_id": group_id}),
        json!({"lesson_num": 1, "title": "Интегралы", "group_id": group_id}),
        json!({"date": "2024-05-17", "lesson_num": 1, "title": "Интегралы"}),
    ] {
        let (status, body) = app
            .request("POST", "/api/lessons", Some(&token), Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "date, lesson_num, title and group_id are required");
    }
}

#[tokio::test]
async fn create_lesson_returns_created_row() {
    let app = spawn_app("lessons-create").await;
    let token = app.register_curator().await;
    let group_id = app.create_group(&token, "ИУ5-31Б").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/lessons",
            Some(&token),
            Some(json!({
                "date": "2024-05-17",
                "lesson_num": 2,
                "title": "Интегралы",
                "group_id": group_id,
                "subgroup_id": 1,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["date"], "2024-05-17");
    assert_eq!(body["lesson_num"], 2);
    assert_eq!(body["title"], "Интегралы");
    assert_eq!(body["group_id"], group_id);
    assert_eq!(body["subgroup_id"], 1);
}

#[tokio::test]
async fn lessons_cannot_be_created_in_a_foreign_group() {
    let app = spawn_app("lessons-foreign-create").await;
    let token = app.register_curator().await;
    let group_id = app.create_group(&token, "ИУ5-31Б").await;

    let (_, rival_token) = app.seed_user("rival@example.com").await;
    let (status, body) = app
        .request(
            "POST",
            "/api/lessons",
            Some(&rival_token),
            Some(json!({
                "date": "2024-05-17",
                "lesson_num": 1,
                "title": "Чужое занятие",
                "group_id": group_id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "group not found");
}

#[tokio::test]
async fn lesson_by_id_comes_back_as_single_element_list() {
    let app = spawn_app("lessons-by-id").await;
    let token = app.register_curator().await;
    let group_id = app.create_group(&token, "ИУ5-31Б").await;
    let lesson_id = app
        .create_lesson(&token, group_id, "2024-05-17", 1, "Интегралы")
        .await;

    let (status, body) = app
        .request(
            "GET",
            &format!("/api/lessons?id={lesson_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], lesson_id);
    assert_eq!(rows[0]["title"], "Интегралы");

    // Foreign curators cannot see it, even by direct id.
    let (_, rival_token) = app.seed_user("rival@example.com").await;
    let (status, body) = app
        .request(
            "GET",
            &format!("/api/lessons?id={lesson_id}"),
            Some(&rival_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "lesson not found");

    let (status, _) = app
        .request("GET", "/api/lessons?id=999999", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lesson_list_is_ordered_and_date_filtered() {
    let app = spawn_app("lessons-list").await;
    let token = app.register_curator().await;
    let group_id = app.create_group(&token, "ИУ5-31Б").await;

    // Created out of order on purpose.
    app.create_lesson(&token, group_id, "2024-05-24", 1, "Ряды").await;
    app.create_lesson(&token, group_id, "2024-05-17", 2, "Семинар").await;
    app.create_lesson(&token, group_id, "2024-05-17", 1, "Интегралы").await;
    app.create_lesson(&token, group_id, "2024-06-01", 1, "Зачёт").await;

    let (status, body) = app
        .request(
            "GET",
            &format!("/api/lessons?group_id={group_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Интегралы", "Семинар", "Ряды", "Зачёт"]);
    // Every row carries the owning group's name.
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|l| l["group_name"] == "ИУ5-31Б"));

    // Inclusive date range.
    let (status, body) = app
        .request(
            "GET",
            &format!("/api/lessons?group_id={group_id}&date_from=2024-05-17&date_to=2024-05-24"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn lesson_list_requires_group_id() {
    let app = spawn_app("lessons-no-group").await;
    let token = app.register_curator().await;

    let (status, body) = app.request("GET", "/api/lessons", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "group_id is required");
}
