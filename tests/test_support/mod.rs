#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

use dashboardd::api::{self, AppState};
use dashboardd::db;

pub fn fixture_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(rel)
}

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn app_with_dataset(prefix: &str, dataset: &Path) -> Router {
    let dir = temp_dir(prefix);
    let conn = db::open_db(&dir.join("dashboard.db")).expect("open db");
    api::router(AppState::new(conn, dataset.to_path_buf()))
}

/// Router over a fresh database and the shared fixture CSV.
pub fn app(prefix: &str) -> Router {
    app_with_dataset(prefix, &fixture_path("student_data.csv"))
}

pub async fn request(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let resp = app.clone().oneshot(req).await.expect("router is infallible");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response is json")
    };
    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> Value {
    let (status, body) = request(app, "GET", uri, None).await;
    assert_eq!(status, StatusCode::OK, "GET {} -> {}", uri, body);
    body
}

/// True when every number in `v` is finite.
pub fn all_finite(v: &Value) -> bool {
    match v {
        Value::Number(n) => n.as_f64().map(f64::is_finite).unwrap_or(true),
        Value::Array(items) => items.iter().all(all_finite),
        Value::Object(map) => map.values().all(all_finite),
        _ => true,
    }
}

pub fn approx(v: &Value, expected: f64) -> bool {
    v.as_f64().map(|x| (x - expected).abs() < 1e-6).unwrap_or(false)
}
