use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde_json::json;

use crate::api::error::{ApiError, ApiResult};
use crate::api::respond::{created, ok};
use crate::api::types::{parse_body, parse_id, AppState, NewStudent, StudentCreate, StudentPatch};
use crate::db::{self, NOW_SQL};

/// Inserts a student row and returns its id. Callers own the transaction.
pub fn insert_student(conn: &Connection, s: &NewStudent) -> ApiResult<i64> {
    let sql = format!(
        "INSERT INTO students(id, name, department, gpa, attendance, activity_score, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, {now}, {now})",
        now = NOW_SQL
    );
    conn.execute(
        &sql,
        (
            s.id,
            &s.name,
            &s.department,
            s.gpa,
            s.attendance,
            s.activity_score,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

async fn list_students(State(state): State<AppState>) -> ApiResult<Response> {
    let students = state.with_conn(|conn| Ok(db::student_list(conn)?)).await?;
    Ok(ok(json!({
        "success": true,
        "count": students.len(),
        "data": students
    })))
}

async fn create_student(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let new = parse_body::<StudentCreate>(&body)?.validate()?;

    let student = state
        .with_conn(move |conn| {
            if let Some(id) = new.id {
                if db::student_get(conn, id)?.is_some() {
                    return Err(ApiError::conflict(format!("student {} already exists", id)));
                }
            }
            let tx = conn.transaction()?;
            let id = insert_student(&tx, &new)?;
            tx.commit()?;
            db::student_get(conn, id)?
                .ok_or_else(|| ApiError::internal("student vanished after insert"))
        })
        .await?;
    tracing::info!(student_id = student.id, "student created");
    Ok(created(json!({ "success": true, "data": student })))
}

async fn get_student(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&raw_id, "student")?;
    let student = state
        .with_conn(move |conn| {
            db::student_get(conn, id)?.ok_or_else(|| ApiError::not_found("Student not found"))
        })
        .await?;
    Ok(ok(json!({ "success": true, "data": student })))
}

async fn update_student(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let id = parse_id(&raw_id, "student")?;
    let patch = parse_body::<StudentPatch>(&body)?;
    patch.validate()?;

    let student = state
        .with_conn(move |conn| {
            if db::student_get(conn, id)?.is_none() {
                return Err(ApiError::not_found("Student not found"));
            }
            if patch.is_empty() {
                return Err(ApiError::bad_params("patch must include at least one field"));
            }

            let mut set_parts: Vec<String> = Vec::new();
            let mut bind_values: Vec<Value> = Vec::new();
            if let Some(v) = &patch.name {
                set_parts.push("name = ?".into());
                bind_values.push(Value::Text(v.trim().to_string()));
            }
            if let Some(v) = &patch.department {
                set_parts.push("department = ?".into());
                bind_values.push(Value::Text(v.trim().to_string()));
            }
            if let Some(v) = patch.gpa {
                set_parts.push("gpa = ?".into());
                bind_values.push(Value::Real(v));
            }
            if let Some(v) = patch.attendance {
                set_parts.push("attendance = ?".into());
                bind_values.push(Value::Real(v));
            }
            if let Some(v) = patch.activity_score {
                set_parts.push("activity_score = ?".into());
                bind_values.push(Value::Real(v));
            }
            set_parts.push(format!("updated_at = {}", NOW_SQL));

            let sql = format!("UPDATE students SET {} WHERE id = ?", set_parts.join(", "));
            bind_values.push(Value::Integer(id));

            let tx = conn.transaction()?;
            tx.execute(&sql, params_from_iter(bind_values))?;
            tx.commit()?;

            db::student_get(conn, id)?.ok_or_else(|| ApiError::not_found("Student not found"))
        })
        .await?;
    Ok(ok(json!({ "success": true, "data": student })))
}

async fn delete_student(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&raw_id, "student")?;
    state
        .with_conn(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute("DELETE FROM students WHERE id = ?", [id])?;
            if changed == 0 {
                return Err(ApiError::not_found("Student not found"));
            }
            tx.commit()?;
            Ok(())
        })
        .await?;
    tracing::info!(student_id = id, "student deleted");
    Ok(ok(json!({ "success": true, "message": "Student deleted" })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/students", get(list_students).post(create_student))
        .route(
            "/api/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
}
