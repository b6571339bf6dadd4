use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Map, Value};

use crate::api::error::ApiResult;
use crate::api::respond::{analytics, num};
use crate::api::types::AppState;
use crate::calc::{self, percent, GradeCounts, Summary, SCORE_BINS};
use crate::dataset::{Grade, StudentRecord};

const RANGE_COLORS: [&str; 6] = [
    "#059669", "#10b981", "#fbbf24", "#f97316", "#ef4444", "#991b1b",
];

type Metric = fn(&StudentRecord) -> Option<f64>;

const COMPARED_SCORES: [(&str, Metric); 7] = [
    ("totalScore", |r| r.total_score),
    ("midtermScore", |r| r.midterm_score),
    ("finalScore", |r| r.final_score),
    ("assignmentsAvg", |r| r.assignments_avg),
    ("quizzesAvg", |r| r.quizzes_avg),
    ("participationScore", |r| r.participation_score),
    ("projectScore", |r| r.projects_score),
];

fn average_and_range(s: &Summary) -> Value {
    json!({
        "average": num(s.mean),
        "range": { "min": num(s.min), "max": num(s.max) }
    })
}

async fn department_analysis(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let data = calc::department_rollups(&records)
        .iter()
        .map(|d| {
            json!({
                "department": d.department,
                "studentCount": d.student_count,
                "averageScore": num(d.average_score),
                "averageAttendance": num(d.average_attendance),
                "averageParticipation": num(d.average_participation),
                "passRate": d.pass_rate,
                "failCount": d.fail_count,
                "averageGrade": d.modal_grade.map(Grade::as_str).unwrap_or("N/A"),
                "topScore": num(d.top_score),
                "bottomScore": num(d.bottom_score),
            })
        })
        .collect::<Vec<_>>();
    Ok(analytics(json!({ "departmentCount": data.len(), "data": data })))
}

async fn score_comparison(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let mut data = Map::new();
    for (name, key) in COMPARED_SCORES {
        let s = calc::summarize(&records, key);
        data.insert(
            name.to_string(),
            json!({
                "average": num(s.mean),
                "median": num(s.median),
                "stdDev": num(s.std_dev),
            }),
        );
    }
    Ok(analytics(json!({ "data": data })))
}

async fn score_distribution_ranges(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let total = records.len();
    let counts = calc::distribute(records.iter().map(|r| r.total_score), &SCORE_BINS);
    let data = SCORE_BINS
        .iter()
        .zip(counts)
        .zip(RANGE_COLORS)
        .map(|((bin, count), color)| {
            json!({
                "range": bin.label,
                "count": count,
                "percentage": percent(count, total),
                "color": color,
            })
        })
        .collect::<Vec<_>>();
    Ok(analytics(json!({ "totalStudents": total, "data": data })))
}

async fn department_comparison(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let data = calc::department_rollups(&records)
        .iter()
        .map(|d| {
            let mut grades = Map::new();
            for g in Grade::ALL {
                let count = d.grades.get(g);
                grades.insert(
                    g.as_str().to_string(),
                    json!({ "count": count, "percentage": percent(count, d.student_count) }),
                );
            }
            json!({
                "department": d.department,
                "metrics": {
                    "studentCount": d.student_count,
                    "averageScore": num(d.average_score),
                    "averageAttendance": num(d.average_attendance),
                    "averageMidterm": num(d.average_midterm),
                    "averageFinal": num(d.average_final),
                    "averageAssignment": num(d.average_assignment),
                    "averageQuiz": num(d.average_quiz),
                    "averageParticipation": num(d.average_participation),
                    "averageProject": num(d.average_project),
                },
                "gradeDistribution": grades,
            })
        })
        .collect::<Vec<_>>();
    Ok(analytics(json!({ "departmentCount": data.len(), "data": data })))
}

async fn performance_metrics(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let total = records.len();
    let active = records.iter().filter(|r| r.extracurricular).count();
    let online = records.iter().filter(|r| r.internet_access).count();
    let grades = GradeCounts::of(&records);
    let mut breakdown = Map::new();
    for g in Grade::ALL {
        breakdown.insert(g.as_str().to_string(), json!(grades.get(g)));
    }

    Ok(analytics(json!({
        "data": {
            "attendance": average_and_range(&calc::summarize(&records, |r| r.attendance)),
            "academicPerformance": average_and_range(&calc::summarize(&records, |r| r.total_score)),
            "participation": average_and_range(&calc::summarize(&records, |r| r.participation_score)),
            "projectWork": average_and_range(&calc::summarize(&records, |r| r.projects_score)),
            "studyHours": average_and_range(&calc::summarize(&records, |r| r.study_hours_per_week)),
            "extracurricular": {
                "participatingStudents": active,
                "percentage": percent(active, total)
            },
            "internetAccess": {
                "withAccess": online,
                "percentage": percent(online, total)
            },
            "gradeBreakdown": breakdown
        }
    })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/performance/department-analysis", get(department_analysis))
        .route("/api/performance/score-comparison", get(score_comparison))
        .route(
            "/api/performance/score-distribution-ranges",
            get(score_distribution_ranges),
        )
        .route(
            "/api/performance/department-comparison",
            get(department_comparison),
        )
        .route("/api/performance/performance-metrics", get(performance_metrics))
}
