//! JSON response helpers.
//!
//! Analytics payloads carry floats as `Option<f64>` (see [`crate::calc::r2`]),
//! so a missing or non-finite statistic is written as `null`. `serde_json`
//! itself also encodes any stray NaN/Infinity as `null`; nothing else may
//! reach the wire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

pub fn ok(body: Value) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

pub fn created(body: Value) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

/// `{"status": "success", ...fields}` envelope used by the analytics routes.
pub fn analytics(fields: Value) -> Response {
    let mut body = json!({ "status": "success" });
    merge(&mut body, fields);
    ok(body)
}

/// Copies the keys of `extra` into `target` when both are objects.
pub fn merge(target: &mut Value, extra: Value) {
    if let (Some(out), Value::Object(fields)) = (target.as_object_mut(), extra) {
        out.extend(fields);
    }
}

/// Float for a JSON body, rounded to 2 places; `null` when missing or
/// non-finite.
pub fn num(v: Option<f64>) -> Value {
    match crate::calc::r2(v) {
        Some(x) => json!(x),
        None => Value::Null,
    }
}
