use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::api::error::ApiResult;
use crate::api::respond::{analytics, merge, num};
use crate::api::types::AppState;
use crate::calc::{self, Ranked, TOP_N};
use crate::dataset::StudentRecord;

fn identity(r: &StudentRecord) -> serde_json::Value {
    json!({
        "id": r.student_id,
        "firstName": r.first_name,
        "lastName": r.last_name,
        "department": r.department,
    })
}

fn ranked_rows<F>(ranked: &[Ranked<'_>], extra: F) -> Vec<serde_json::Value>
where
    F: Fn(&Ranked<'_>) -> serde_json::Value,
{
    ranked
        .iter()
        .map(|t| {
            let mut row = json!({ "rank": t.rank });
            merge(&mut row, identity(t.record));
            merge(&mut row, extra(t));
            row
        })
        .collect()
}

async fn top_scorers(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let top = calc::top_n(&records, TOP_N, |r| r.total_score);
    let data = ranked_rows(&top, |t| {
        json!({
            "score": num(Some(t.key)),
            "grade": t.record.grade,
            "attendance": num(t.record.attendance),
            "finalScore": num(t.record.final_score),
            "scorePercentage": num(Some(t.key)),
        })
    });
    Ok(analytics(json!({ "count": data.len(), "data": data })))
}

async fn top_attendance(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let top = calc::top_n(&records, TOP_N, |r| r.attendance);
    let data = ranked_rows(&top, |t| {
        json!({
            "attendance": num(Some(t.key)),
            "score": num(t.record.total_score),
            "grade": t.record.grade,
            "studyHours": num(t.record.study_hours_per_week),
        })
    });
    Ok(analytics(json!({ "count": data.len(), "data": data })))
}

async fn top_participants(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let active = records
        .iter()
        .filter(|r| r.extracurricular)
        .cloned()
        .collect::<Vec<_>>();
    let top = calc::top_n(&active, TOP_N, calc::activity_score);
    let data = ranked_rows(&top, |t| {
        json!({
            "participationScore": num(t.record.participation_score),
            "projectScore": num(t.record.projects_score),
            "extracurricular": "Yes",
            "score": num(t.record.total_score),
            "grade": t.record.grade,
            "activityScore": num(Some(t.key)),
            "prizeStatus": calc::prize_status(t.key),
        })
    });
    Ok(analytics(json!({ "count": data.len(), "data": data })))
}

async fn top_overall(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let top = calc::top_n(&records, TOP_N, calc::overall_score);
    let data = ranked_rows(&top, |t| {
        json!({
            "academicScore": num(t.record.total_score),
            "attendanceRate": num(t.record.attendance),
            "participationScore": num(t.record.participation_score),
            "grade": t.record.grade,
            "overallScore": num(Some(t.key)),
        })
    });
    Ok(analytics(json!({ "count": data.len(), "data": data })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/overview/top-scorers", get(top_scorers))
        .route("/api/overview/top-attendance", get(top_attendance))
        .route("/api/overview/top-participants", get(top_participants))
        .route("/api/overview/top-overall", get(top_overall))
}
