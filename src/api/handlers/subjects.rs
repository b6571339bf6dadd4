use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, put};
use axum::Router;
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;

use super::students::insert_student;
use crate::api::error::{ApiError, ApiResult};
use crate::api::respond::{created, num, ok};
use crate::api::types::{
    parse_body, parse_id, AppState, CatalogCreate, CatalogPatch, ComponentPatch, Components,
    ScorePatch, SubjectScoreCreate,
};
use crate::db::{self, score_percentage, SubjectScore, NOW_SQL};

const SUBJECT_COLORS: [&str; 8] = [
    "#3b82f6", "#10b981", "#8b5cf6", "#f59e0b", "#ef4444", "#ec4899", "#06b6d4", "#f97316",
];

fn score_json(s: &SubjectScore) -> serde_json::Value {
    let mut v = json!(s);
    v["percentage"] = num(Some(s.percentage));
    v
}

fn components_of(s: &SubjectScore) -> Components {
    Components {
        assignment: s.assignment,
        test: s.test,
        project: s.project,
        quiz: s.quiz,
    }
}

/// Writes marks, components and the derived percentage in one statement.
fn store_marks(
    conn: &Connection,
    score_id: i64,
    marks: f64,
    max_marks: f64,
    c: &Components,
) -> ApiResult<()> {
    conn.execute(
        &format!(
            "UPDATE student_subjects
             SET marks = ?, max_marks = ?, percentage = ?,
                 assignment = ?, test = ?, project = ?, quiz = ?,
                 updated_at = {}
             WHERE id = ?",
            NOW_SQL
        ),
        (
            marks,
            max_marks,
            score_percentage(marks, max_marks),
            c.assignment,
            c.test,
            c.project,
            c.quiz,
            score_id,
        ),
    )?;
    Ok(())
}

fn load_score(conn: &Connection, id: i64) -> ApiResult<SubjectScore> {
    db::score_get(conn, id)?.ok_or_else(|| ApiError::internal("subject score vanished after write"))
}

async fn list_student_subjects(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let student_id = parse_id(&raw_id, "student")?;
    let scores = state
        .with_conn(move |conn| Ok(db::scores_for_student(conn, student_id)?))
        .await?;
    Ok(ok(json!({
        "success": true,
        "data": scores.iter().map(score_json).collect::<Vec<_>>(),
        "total": scores.len()
    })))
}

async fn add_subject_score(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let student_id = parse_id(&raw_id, "student")?;
    let req = parse_body::<SubjectScoreCreate>(&body)?;
    let new = req.validate()?;
    let fallback = req.default_student(student_id);

    let saved = state
        .with_conn(move |conn| {
            let tx = conn.transaction()?;

            if db::student_get(&tx, student_id)?.is_none() {
                insert_student(&tx, &fallback)?;
                tracing::info!(student_id, name = %fallback.name, "auto-created student for subject score");
            }

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM student_subjects WHERE student_id = ? AND subject_name = ?",
                    (student_id, &new.subject_name),
                    |r| r.get(0),
                )
                .optional()?;

            let score_id = match existing {
                Some(id) => {
                    tracing::info!(student_id, subject = %new.subject_name, "subject already recorded, updating");
                    id
                }
                None => {
                    tx.execute(
                        &format!(
                            "INSERT INTO student_subjects(student_id, subject_name, marks, max_marks, percentage, created_at)
                             VALUES(?, ?, 0, ?, 0, {})",
                            NOW_SQL
                        ),
                        (student_id, &new.subject_name, new.max_marks),
                    )?;
                    tx.last_insert_rowid()
                }
            };
            store_marks(&tx, score_id, new.marks, new.max_marks, &new.components)?;
            let saved = load_score(&tx, score_id)?;
            tx.commit()?;
            Ok(saved)
        })
        .await?;

    Ok(created(json!({
        "success": true,
        "data": score_json(&saved),
        "message": "Subject score added successfully"
    })))
}

async fn update_student_subject_marks(
    State(state): State<AppState>,
    Path((raw_student, raw_subject)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Response> {
    let student_id = parse_id(&raw_student, "student")?;
    let score_id = parse_id(&raw_subject, "subject")?;
    let patch = parse_body::<ComponentPatch>(&body)?;

    let saved = state
        .with_conn(move |conn| {
            if db::student_get(conn, student_id)?.is_none() {
                return Err(ApiError::not_found("Student not found"));
            }
            let current = match db::score_get(conn, score_id)? {
                Some(s) if s.student_id == student_id => s,
                _ => return Err(ApiError::not_found("Subject not found for this student")),
            };
            let components = patch.apply(components_of(&current))?;
            let marks = components.total();

            let tx = conn.transaction()?;
            store_marks(&tx, score_id, marks, current.max_marks, &components)?;
            let saved = load_score(&tx, score_id)?;
            tx.commit()?;
            Ok(saved)
        })
        .await?;

    Ok(ok(json!({
        "success": true,
        "data": score_json(&saved),
        "message": "Marks updated successfully"
    })))
}

async fn update_subject_score(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let score_id = parse_id(&raw_id, "subject")?;
    let patch = parse_body::<ScorePatch>(&body)?;
    patch.validate()?;

    let saved = state
        .with_conn(move |conn| {
            let current = db::score_get(conn, score_id)?
                .ok_or_else(|| ApiError::not_found("Subject score not found"))?;
            let marks = patch.marks.unwrap_or(current.marks);
            let max_marks = patch.max_marks.unwrap_or(current.max_marks);

            let tx = conn.transaction()?;
            if let Some(name) = &patch.name {
                tx.execute(
                    "UPDATE student_subjects SET subject_name = ? WHERE id = ?",
                    (name.trim(), score_id),
                )?;
            }
            store_marks(&tx, score_id, marks, max_marks, &components_of(&current))?;
            let saved = load_score(&tx, score_id)?;
            tx.commit()?;
            Ok(saved)
        })
        .await?;

    Ok(ok(json!({
        "success": true,
        "data": score_json(&saved),
        "message": "Subject score updated successfully"
    })))
}

async fn delete_subject_score(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let score_id = parse_id(&raw_id, "subject")?;
    state
        .with_conn(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute("DELETE FROM student_subjects WHERE id = ?", [score_id])?;
            if changed == 0 {
                return Err(ApiError::not_found("Subject score not found"));
            }
            tx.commit()?;
            Ok(())
        })
        .await?;
    Ok(ok(json!({
        "success": true,
        "message": "Subject score deleted successfully"
    })))
}

async fn student_marks_breakdown(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let student_id = parse_id(&raw_id, "student")?;
    let scores = state
        .with_conn(move |conn| Ok(db::scores_for_student(conn, student_id)?))
        .await?;
    let rows = scores
        .iter()
        .map(|s| {
            json!({
                "subject": s.name,
                "assignment": s.assignment,
                "test": s.test,
                "project": s.project,
                "quiz": s.quiz,
                "totalMarks": s.marks,
                "maxMarks": s.max_marks,
                "percentage": num(Some(s.percentage)),
            })
        })
        .collect::<Vec<_>>();
    Ok(ok(json!({
        "success": true,
        "total": rows.len(),
        "data": rows
    })))
}

async fn subjects_stats(State(state): State<AppState>) -> ApiResult<Response> {
    let scores = state.with_conn(|conn| Ok(db::score_list(conn)?)).await?;

    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&SubjectScore>> = HashMap::new();
    for s in &scores {
        let entry = grouped.entry(s.name.as_str()).or_default();
        if entry.is_empty() {
            order.push(s.name.as_str());
        }
        entry.push(s);
    }

    let data = order
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let rows = &grouped[name];
            let avg = if rows.is_empty() {
                0.0
            } else {
                rows.iter().map(|s| s.percentage).sum::<f64>() / rows.len() as f64
            };
            json!({
                "name": name,
                "avgScore": num(Some(avg)),
                "color": SUBJECT_COLORS[i % SUBJECT_COLORS.len()],
                "students": rows.len(),
                "totalMarks": num(Some(rows.iter().map(|s| s.marks).sum::<f64>())),
            })
        })
        .collect::<Vec<_>>();

    Ok(ok(json!({
        "success": true,
        "total": data.len(),
        "data": data
    })))
}

async fn subjects_export(State(state): State<AppState>) -> ApiResult<Response> {
    let data = state
        .with_conn(|conn| {
            let students = db::student_list(conn)?;
            let mut data = Vec::with_capacity(students.len());
            for student in &students {
                let mut v = json!(student);
                v["subjects"] = json!(db::scores_for_student(conn, student.id)?
                    .iter()
                    .map(score_json)
                    .collect::<Vec<_>>());
                data.push(v);
            }
            Ok(data)
        })
        .await?;
    Ok(ok(json!({
        "success": true,
        "total": data.len(),
        "data": data
    })))
}

async fn list_catalog(State(state): State<AppState>) -> ApiResult<Response> {
    let subjects = state
        .with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, created_at, updated_at FROM subjects ORDER BY id",
            )?;
            let subjects = stmt
                .query_map([], db::catalog_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(subjects)
        })
        .await?;
    Ok(ok(json!({
        "success": true,
        "total": subjects.len(),
        "data": subjects
    })))
}

async fn create_catalog_subject(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Response> {
    let req = parse_body::<CatalogCreate>(&body)?;
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_params("Subject name is required"))?
        .to_string();
    let description = req.description.unwrap_or_default();

    let subject = state
        .with_conn(move |conn| {
            let exists: Option<i64> = conn
                .query_row("SELECT id FROM subjects WHERE name = ?", [&name], |r| r.get(0))
                .optional()?;
            if exists.is_some() {
                return Err(ApiError::conflict("Subject already exists"));
            }

            let tx = conn.transaction()?;
            tx.execute(
                &format!(
                    "INSERT INTO subjects(name, description, created_at, updated_at) VALUES(?, ?, {now}, {now})",
                    now = NOW_SQL
                ),
                (&name, &description),
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            db::catalog_get(conn, id)?
                .ok_or_else(|| ApiError::internal("subject vanished after insert"))
        })
        .await?;
    tracing::info!(subject = %subject.name, "catalogue subject created");
    Ok(created(json!({
        "success": true,
        "data": subject,
        "message": "Subject created successfully"
    })))
}

async fn update_catalog_subject(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let id = parse_id(&raw_id, "subject")?;
    let patch = parse_body::<CatalogPatch>(&body)?;

    let subject = state
        .with_conn(move |conn| {
            let current = db::catalog_get(conn, id)?
                .ok_or_else(|| ApiError::not_found("Subject not found"))?;
            let name = match patch.name.as_deref().map(str::trim) {
                Some("") => return Err(ApiError::bad_params("Subject name must not be empty")),
                Some(n) => n.to_string(),
                None => current.name.clone(),
            };
            let description = patch.description.or(current.description);

            let tx = conn.transaction()?;
            tx.execute(
                &format!(
                    "UPDATE subjects SET name = ?, description = ?, updated_at = {} WHERE id = ?",
                    NOW_SQL
                ),
                (&name, description.as_deref(), id),
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(f, _)
                    if f.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    ApiError::conflict("Subject already exists")
                }
                other => ApiError::from(other),
            })?;
            tx.commit()?;

            db::catalog_get(conn, id)?.ok_or_else(|| ApiError::not_found("Subject not found"))
        })
        .await?;
    Ok(ok(json!({ "success": true, "data": subject })))
}

async fn delete_catalog_subject(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&raw_id, "subject")?;
    let (name, removed) = state
        .with_conn(move |conn| {
            let subject = db::catalog_get(conn, id)?
                .ok_or_else(|| ApiError::not_found("Subject not found"))?;

            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM student_subjects WHERE subject_name = ?",
                [&subject.name],
            )?;
            tx.execute("DELETE FROM subjects WHERE id = ?", [id])?;
            tx.commit()?;
            Ok((subject.name, removed))
        })
        .await?;

    tracing::info!(subject = %name, removed_scores = removed, "catalogue subject deleted");
    Ok(ok(json!({ "success": true, "message": "Subject deleted" })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/subjects/student/:id/subjects",
            get(list_student_subjects).post(add_subject_score),
        )
        .route(
            "/api/subjects/student/:id/subject/:subject_id",
            put(update_student_subject_marks),
        )
        .route("/api/subjects/student/:id/marks", get(student_marks_breakdown))
        .route(
            "/api/subjects/subject/:id",
            put(update_subject_score).delete(delete_subject_score),
        )
        .route("/api/subjects/students/subjects-stats", get(subjects_stats))
        .route("/api/subjects/students/subjects-export", get(subjects_export))
        .route(
            "/api/subjects/management",
            get(list_catalog).post(create_catalog_subject),
        )
        .route(
            "/api/subjects/management/:id",
            put(update_catalog_subject).delete(delete_catalog_subject),
        )
}
