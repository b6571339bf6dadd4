use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::api::error::ApiResult;
use crate::api::respond::{analytics, num};
use crate::api::types::AppState;
use crate::calc::{self, percent, GradeCounts, Summary, ATTENDANCE_BINS};
use crate::dataset::Grade;
use crate::risk;

const GRADE_COLORS: [&str; 5] = ["#059669", "#10b981", "#fbbf24", "#f97316", "#ef4444"];
const BIN_COLORS: [&str; 6] = [
    "#059669", "#10b981", "#fbbf24", "#f97316", "#ef4444", "#991b1b",
];

async fn pass_fail_rate(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let refs = records.iter().collect::<Vec<_>>();
    let passed = calc::pass_count(&refs);
    let failed = records.len() - passed;
    let total = passed + failed;
    let pass_pct = percent(passed, total);
    let fail_pct = percent(failed, total);

    Ok(analytics(json!({
        "pass_rate": pass_pct,
        "fail_rate": fail_pct,
        "data": {
            "passed": passed,
            "failed": failed,
            "total": total,
            "passPercentage": pass_pct,
            "failPercentage": fail_pct,
            "chartData": [
                { "label": "Passed (A-D)", "value": passed, "percentage": pass_pct, "color": "#10b981" },
                { "label": "Failed (F)", "value": failed, "percentage": fail_pct, "color": "#ef4444" }
            ]
        }
    })))
}

async fn grade_distribution(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let counts = GradeCounts::of(&records);
    let total = records.len();
    let data = Grade::ALL
        .iter()
        .zip(GRADE_COLORS)
        .map(|(g, color)| {
            json!({
                "grade": g.as_str(),
                "count": counts.get(*g),
                "percentage": percent(counts.get(*g), total),
                "color": color,
            })
        })
        .collect::<Vec<_>>();
    Ok(analytics(json!({ "total": total, "data": data })))
}

async fn attendance_distribution(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let total = records.len();
    let counts = calc::distribute(records.iter().map(|r| r.attendance), &ATTENDANCE_BINS);
    let ranges = ATTENDANCE_BINS
        .iter()
        .zip(counts)
        .zip(BIN_COLORS)
        .map(|((bin, students), color)| {
            json!({
                "range": bin.label,
                "students": students,
                "percentage": percent(students, total),
                "color": color,
            })
        })
        .collect::<Vec<_>>();

    let mean_attendance = Summary::of(records.iter().map(|r| r.attendance)).mean;
    let monthly = calc::monthly_trend(mean_attendance)
        .into_iter()
        .map(|(month, v)| json!({ "month": month, "attendance": num(v) }))
        .collect::<Vec<_>>();

    Ok(analytics(json!({
        "total": total,
        "averageAttendance": num(mean_attendance),
        "rangeDistribution": ranges,
        "monthlyTrend": monthly
    })))
}

async fn risk_students(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let counts = risk::count_tiers(&records);
    let data = risk::at_risk(&records)
        .iter()
        .map(|flagged| {
            let r = flagged.record;
            json!({
                "id": r.student_id,
                "firstName": r.first_name,
                "lastName": r.last_name,
                "department": r.department,
                "grade": r.grade,
                "attendance": num(r.attendance),
                "score": num(r.total_score),
                "riskLevel": flagged.tier.as_str(),
                "riskScore": flagged.tier.score(),
                "recommendation": flagged.tier.recommendations(),
            })
        })
        .collect::<Vec<_>>();

    Ok(analytics(json!({
        "statistics": {
            "totalAtRisk": counts.total(),
            "criticalRisk": counts.critical,
            "highRisk": counts.high,
            "mediumRisk": counts.medium,
            "riskPercentage": percent(counts.total(), records.len())
        },
        "data": data
    })))
}

async fn statistics(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.records().await?;
    let score = calc::summarize(&records, |r| r.total_score);
    let attendance = calc::summarize(&records, |r| r.attendance);
    let participation = calc::summarize(&records, |r| r.participation_score);
    let at_risk = risk::count_tiers(&records).total();

    Ok(analytics(json!({
        "data": {
            "totalStudents": records.len(),
            "averageScore": score.mean,
            "averageAttendance": attendance.mean,
            "averageParticipation": participation.mean,
            "medianScore": score.median,
            "medianAttendance": attendance.median,
            "scoreStdDev": score.std_dev,
            "attendanceStdDev": attendance.std_dev,
            "minScore": score.min,
            "maxScore": score.max,
            "minAttendance": attendance.min,
            "maxAttendance": attendance.max,
            "atRiskCount": at_risk
        }
    })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/distribution/pass-fail-rate", get(pass_fail_rate))
        .route("/api/distribution/grade-distribution", get(grade_distribution))
        .route(
            "/api/distribution/attendance-distribution",
            get(attendance_distribution),
        )
        .route("/api/distribution/risk-students", get(risk_students))
        .route("/api/distribution/statistics", get(statistics))
}
