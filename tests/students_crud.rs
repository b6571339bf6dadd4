mod test_support;

use axum::http::StatusCode;
use serde_json::json;
use test_support::{app, request};

#[tokio::test]
async fn student_lifecycle_create_read_update_delete() {
    let app = app("dashboard-students-crud");

    let (status, body) = request(&app, "GET", "/api/students", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["count"], json!(0));

    let (status, created) = request(
        &app,
        "POST",
        "/api/students",
        Some(json!({
            "name": "  Ada Byron ",
            "department": "Mathematics",
            "gpa": 3.9,
            "attendance": 97.5,
            "activityScore": 88
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let id = created["data"]["id"].as_i64().expect("student id");
    assert_eq!(created["data"]["name"], json!("Ada Byron"));
    assert_eq!(created["data"]["activityScore"], json!(88.0));
    assert!(created["data"]["created_at"].is_string());

    let (status, fetched) = request(&app, "GET", &format!("/api/students/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["department"], json!("Mathematics"));

    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/students/{}", id),
        Some(json!({ "gpa": 3.5, "department": "Physics" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["data"]["gpa"], json!(3.5));
    assert_eq!(updated["data"]["department"], json!("Physics"));
    assert_eq!(updated["data"]["name"], json!("Ada Byron"));

    let (_, listed) = request(&app, "GET", "/api/students", None).await;
    assert_eq!(listed["count"], json!(1));

    let (status, _) = request(&app, "DELETE", &format!("/api/students/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, missing) = request(&app, "GET", &format!("/api/students/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"], json!("Student not found"));
}

#[tokio::test]
async fn student_validation_and_missing_rows() {
    let app = app("dashboard-students-validation");

    let (status, body) = request(&app, "POST", "/api/students", Some(json!({ "department": "CS" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or("").contains("name"));

    let (status, _) = request(&app, "POST", "/api/students", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        "/api/students",
        Some(json!({ "name": "X", "department": "CS", "gpa": "high" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(&app, "GET", "/api/students/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(&app, "PUT", "/api/students/404", Some(json!({ "gpa": 1.0 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&app, "DELETE", "/api/students/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn explicit_id_conflicts_and_empty_patch_is_rejected() {
    let app = app("dashboard-students-conflict");
    let body = json!({ "id": 42, "name": "Kim", "department": "Arts" });

    let (status, created) = request(&app, "POST", "/api/students", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["id"], json!(42));

    let (status, _) = request(&app, "POST", "/api/students", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = request(&app, "PUT", "/api/students/42", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_index_and_unknown_routes() {
    let app = app("dashboard-core-routes");

    let (status, health) = request(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], json!("ok"));

    let (status, index) = request(&app, "GET", "/api", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(index["endpoints"].is_object());

    let (status, body) = request(&app, "GET", "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_writes_and_analytics_reads_all_complete() {
    let app = app("dashboard-students-concurrent");
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let writer = app.clone();
        tasks.spawn(async move {
            let body = json!({ "name": format!("Student {}", i), "department": "CS" });
            request(&writer, "POST", "/api/students", Some(body)).await.0
        });
        let reader = app.clone();
        tasks.spawn(async move {
            request(&reader, "GET", "/api/distribution/statistics", None).await.0
        });
    }
    while let Some(joined) = tasks.join_next().await {
        let status = joined.expect("request task");
        assert!(
            status == StatusCode::CREATED || status == StatusCode::OK,
            "unexpected {}",
            status
        );
    }

    let (_, listed) = request(&app, "GET", "/api/students", None).await;
    assert_eq!(listed["count"], json!(8));
}
