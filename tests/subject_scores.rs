mod test_support;

use axum::http::StatusCode;
use serde_json::{json, Value};
use test_support::{app, approx, request};

async fn create_student(app: &axum::Router, name: &str) -> i64 {
    let (status, body) = request(
        app,
        "POST",
        "/api/students",
        Some(json!({ "name": name, "department": "Science" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_i64().expect("id")
}

async fn add_score(app: &axum::Router, student: i64, body: Value) -> (StatusCode, Value) {
    request(
        app,
        "POST",
        &format!("/api/subjects/student/{}/subjects", student),
        Some(body),
    )
    .await
}

#[tokio::test]
async fn components_sum_into_marks_and_percentage() {
    let app = app("dashboard-subject-components");
    let sid = create_student(&app, "Lena").await;

    let (status, body) = add_score(
        &app,
        sid,
        json!({ "name": "Physics", "assignment": 18, "test": 22, "project": 20, "quiz": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(approx(&body["data"]["marks"], 70.0));
    assert!(approx(&body["data"]["maxMarks"], 100.0));
    assert!(approx(&body["data"]["percentage"], 70.0));
    assert_eq!(body["data"]["name"], json!("Physics"));

    let (status, listed) = request(
        &app,
        "GET",
        &format!("/api/subjects/student/{}/subjects", sid),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], json!(1));
}

#[tokio::test]
async fn component_put_is_idempotent() {
    let app = app("dashboard-subject-put");
    let sid = create_student(&app, "Omar").await;
    let (_, body) = add_score(&app, sid, json!({ "subject_name": "Chemistry", "marks": 40 })).await;
    let score_id = body["data"]["id"].as_i64().expect("score id");
    assert!(approx(&body["data"]["percentage"], 40.0));

    let uri = format!("/api/subjects/student/{}/subject/{}", sid, score_id);
    let patch = json!({ "assignment": 15, "test": 20, "project": 25, "quiz": 12 });
    let (status, first) = request(&app, "PUT", &uri, Some(patch.clone())).await;
    assert_eq!(status, StatusCode::OK, "{}", first);
    let (_, second) = request(&app, "PUT", &uri, Some(patch)).await;

    assert!(approx(&first["data"]["marks"], 72.0));
    assert_eq!(first["data"]["marks"], second["data"]["marks"]);
    assert_eq!(first["data"]["percentage"], second["data"]["percentage"]);
    assert!(approx(&second["data"]["percentage"], 72.0));

    // Unset components keep their stored value.
    let (_, third) = request(&app, "PUT", &uri, Some(json!({ "quiz": 2 }))).await;
    assert!(approx(&third["data"]["marks"], 62.0));
    assert!(approx(&third["data"]["assignment"], 15.0));
}

#[tokio::test]
async fn invalid_scores_are_rejected() {
    let app = app("dashboard-subject-validation");
    let sid = create_student(&app, "Pia").await;

    let (status, body) = add_score(&app, sid, json!({ "name": "Art", "assignment": 21 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Assignment must be between 0-20"));

    let (status, _) = add_score(&app, sid, json!({ "marks": 50 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = add_score(&app, sid, json!({ "name": "Art" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = add_score(&app, sid, json!({ "name": "Art", "marks": 120 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, ok) = add_score(&app, sid, json!({ "name": "Art", "marks": 50 })).await;
    let score_id = ok["data"]["id"].as_i64().expect("score id");
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/subjects/student/{}/subject/{}", sid, score_id),
        Some(json!({ "quiz": 16 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/subjects/student/{}/subject/{}", sid + 1000, score_id),
        Some(json!({ "quiz": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn posting_for_unknown_student_creates_it() {
    let app = app("dashboard-subject-autocreate");
    let (status, body) = add_score(&app, 77, json!({ "name": "History", "marks": 65 })).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (status, student) = request(&app, "GET", "/api/students/77", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(student["data"]["name"], json!("Student 77"));
    assert_eq!(student["data"]["department"], json!("Unknown"));

    // Same subject again updates the existing row.
    let (_, again) = add_score(&app, 77, json!({ "name": "History", "marks": 80 })).await;
    assert_eq!(again["data"]["id"], body["data"]["id"]);
    let (_, listed) = request(&app, "GET", "/api/subjects/student/77/subjects", None).await;
    assert_eq!(listed["total"], json!(1));
    assert!(approx(&listed["data"][0]["marks"], 80.0));
}

#[tokio::test]
async fn deleting_student_cascades_to_scores() {
    let app = app("dashboard-subject-cascade");
    let sid = create_student(&app, "Quinn").await;
    add_score(&app, sid, json!({ "name": "Biology", "marks": 55 })).await;
    add_score(&app, sid, json!({ "name": "Music", "marks": 91 })).await;

    let (_, stats) = request(&app, "GET", "/api/subjects/students/subjects-stats", None).await;
    assert_eq!(stats["total"], json!(2));

    let (status, _) = request(&app, "DELETE", &format!("/api/students/{}", sid), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = request(
        &app,
        "GET",
        &format!("/api/subjects/student/{}/subjects", sid),
        None,
    )
    .await;
    assert_eq!(listed["total"], json!(0));
    let (_, stats) = request(&app, "GET", "/api/subjects/students/subjects-stats", None).await;
    assert_eq!(stats["total"], json!(0));
}

#[tokio::test]
async fn direct_score_update_and_delete() {
    let app = app("dashboard-subject-direct");
    let sid = create_student(&app, "Rae").await;
    let (_, body) = add_score(&app, sid, json!({ "name": "Drama", "marks": 30 })).await;
    let score_id = body["data"]["id"].as_i64().expect("score id");

    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/subjects/subject/{}", score_id),
        Some(json!({ "marks": 45, "maxMarks": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert!(approx(&updated["data"]["percentage"], 90.0));

    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/subjects/subject/{}", score_id),
        Some(json!({ "maxMarks": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(approx(&updated["data"]["percentage"], 0.0));

    let (status, breakdown) = request(&app, "GET", &format!("/api/subjects/student/{}/marks", sid), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(breakdown["data"][0]["subject"], json!("Drama"));

    let (status, _) = request(&app, "DELETE", &format!("/api/subjects/subject/{}", score_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(&app, "DELETE", &format!("/api/subjects/subject/{}", score_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn subject_catalogue_management() {
    let app = app("dashboard-subject-catalogue");

    let (status, created) = request(
        &app,
        "POST",
        "/api/subjects/management",
        Some(json!({ "name": "Geography", "description": "Maps" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let id = created["data"]["id"].as_i64().expect("catalogue id");

    let (status, _) = request(
        &app,
        "POST",
        "/api/subjects/management",
        Some(json!({ "name": "Geography" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, renamed) = request(
        &app,
        "PUT",
        &format!("/api/subjects/management/{}", id),
        Some(json!({ "name": "Earth Science" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["data"]["name"], json!("Earth Science"));
    assert_eq!(renamed["data"]["description"], json!("Maps"));

    let (_, listed) = request(&app, "GET", "/api/subjects/management", None).await;
    assert_eq!(listed["total"], json!(1));

    let (status, _) = request(&app, "DELETE", &format!("/api/subjects/management/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(&app, "DELETE", &format!("/api/subjects/management/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_nests_scores_under_students() {
    let app = app("dashboard-subject-export");
    let sid = create_student(&app, "Sam").await;
    add_score(&app, sid, json!({ "name": "Latin", "marks": 61 })).await;

    let (status, export) = request(&app, "GET", "/api/subjects/students/subjects-export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(export["total"], json!(1));
    assert_eq!(export["data"][0]["subjects"][0]["name"], json!("Latin"));
}
