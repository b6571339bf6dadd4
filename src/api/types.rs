use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use crate::dataset::{self, StudentRecord, ROW_CAP};
use crate::db::DEFAULT_MAX_MARKS;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub dataset: PathBuf,
}

impl AppState {
    pub fn new(conn: Connection, dataset: PathBuf) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            dataset,
        }
    }

    /// Runs `f` against the shared connection on the blocking pool.
    pub async fn with_conn<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Connection) -> ApiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|_| ApiError::internal("database connection poisoned"))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| ApiError::internal(format!("database task failed: {}", e)))?
    }

    /// Fresh load of the analytics dataset for this request.
    pub async fn records(&self) -> ApiResult<Vec<StudentRecord>> {
        let path = self.dataset.clone();
        let loaded = tokio::task::spawn_blocking(move || dataset::load_dataset(&path, ROW_CAP))
            .await
            .map_err(|e| ApiError::internal(format!("dataset task failed: {}", e)))?;
        loaded.map_err(|e| {
            tracing::warn!(path = %self.dataset.display(), "dataset load failed: {:#}", e);
            ApiError::data_not_found()
        })
    }
}

pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ApiError::bad_params("missing request body"));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_params(format!("invalid request body: {}", e)))
}

pub fn parse_id(raw: &str, what: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_params(format!("invalid {} id: {}", what, raw)))
}

fn trimmed(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn check_number(label: &str, v: f64) -> ApiResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ApiError::bad_params(format!("{} must be a number", label)))
    }
}

#[derive(Debug, Deserialize)]
pub struct StudentCreate {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub gpa: Option<f64>,
    pub attendance: Option<f64>,
    #[serde(rename = "activityScore")]
    pub activity_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub id: Option<i64>,
    pub name: String,
    pub department: String,
    pub gpa: f64,
    pub attendance: f64,
    pub activity_score: f64,
}

impl StudentCreate {
    pub fn validate(self) -> ApiResult<NewStudent> {
        let name = trimmed(self.name).ok_or_else(|| ApiError::bad_params("name is required"))?;
        let department =
            trimmed(self.department).ok_or_else(|| ApiError::bad_params("department is required"))?;
        Ok(NewStudent {
            id: self.id,
            name,
            department,
            gpa: check_number("gpa", self.gpa.unwrap_or(0.0))?,
            attendance: check_number("attendance", self.attendance.unwrap_or(0.0))?,
            activity_score: check_number("activityScore", self.activity_score.unwrap_or(0.0))?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub department: Option<String>,
    pub gpa: Option<f64>,
    pub attendance: Option<f64>,
    #[serde(rename = "activityScore")]
    pub activity_score: Option<f64>,
}

impl StudentPatch {
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(n) = &self.name {
            if n.trim().is_empty() {
                return Err(ApiError::bad_params("name must not be empty"));
            }
        }
        if let Some(d) = &self.department {
            if d.trim().is_empty() {
                return Err(ApiError::bad_params("department must not be empty"));
            }
        }
        for (label, v) in [
            ("gpa", self.gpa),
            ("attendance", self.attendance),
            ("activityScore", self.activity_score),
        ] {
            if let Some(v) = v {
                check_number(label, v)?;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.department.is_none()
            && self.gpa.is_none()
            && self.attendance.is_none()
            && self.activity_score.is_none()
    }
}

/// Component marks and their allowed maxima.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Components {
    pub assignment: f64,
    pub test: f64,
    pub project: f64,
    pub quiz: f64,
}

pub const ASSIGNMENT_MAX: f64 = 20.0;
pub const TEST_MAX: f64 = 25.0;
pub const PROJECT_MAX: f64 = 25.0;
pub const QUIZ_MAX: f64 = 15.0;

fn check_component(label: &str, v: f64, max: f64) -> ApiResult<()> {
    if !v.is_finite() || v < 0.0 || v > max {
        return Err(ApiError::bad_params(format!(
            "{} must be between 0-{}",
            label, max
        )));
    }
    Ok(())
}

impl Components {
    pub fn validate(&self) -> ApiResult<()> {
        check_component("Assignment", self.assignment, ASSIGNMENT_MAX)?;
        check_component("Test", self.test, TEST_MAX)?;
        check_component("Project", self.project, PROJECT_MAX)?;
        check_component("Quiz", self.quiz, QUIZ_MAX)?;
        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.assignment + self.test + self.project + self.quiz
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubjectScoreCreate {
    pub subject_name: Option<String>,
    pub name: Option<String>,
    pub marks: Option<f64>,
    pub assignment: Option<f64>,
    pub test: Option<f64>,
    pub project: Option<f64>,
    pub quiz: Option<f64>,
    // Defaults used when the owning student has to be created.
    pub student_name: Option<String>,
    pub department: Option<String>,
    pub gpa: Option<f64>,
    pub attendance: Option<f64>,
    #[serde(rename = "activityScore")]
    pub activity_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubjectScore {
    pub subject_name: String,
    pub components: Components,
    pub marks: f64,
    pub max_marks: f64,
}

impl SubjectScoreCreate {
    fn has_components(&self) -> bool {
        self.assignment.is_some() || self.test.is_some() || self.project.is_some() || self.quiz.is_some()
    }

    pub fn validate(&self) -> ApiResult<NewSubjectScore> {
        let subject_name = trimmed(self.subject_name.clone())
            .or_else(|| trimmed(self.name.clone()))
            .ok_or_else(|| ApiError::bad_params("Missing required fields: name, marks"))?;
        if !self.has_components() && self.marks.is_none() {
            return Err(ApiError::bad_params("Missing required fields: name, marks"));
        }

        let components = Components {
            assignment: self.assignment.unwrap_or(0.0),
            test: self.test.unwrap_or(0.0),
            project: self.project.unwrap_or(0.0),
            quiz: self.quiz.unwrap_or(0.0),
        };
        components.validate()?;

        let max_marks = DEFAULT_MAX_MARKS;
        let marks = match self.marks {
            Some(m) if !self.has_components() => check_number("marks", m)?,
            _ => components.total(),
        };
        if marks < 0.0 || marks > max_marks {
            return Err(ApiError::bad_params(format!(
                "Total marks must be between 0-{}",
                max_marks
            )));
        }

        Ok(NewSubjectScore {
            subject_name,
            components,
            marks,
            max_marks,
        })
    }

    pub fn default_student(&self, student_id: i64) -> NewStudent {
        NewStudent {
            id: Some(student_id),
            name: trimmed(self.student_name.clone())
                .unwrap_or_else(|| format!("Student {}", student_id)),
            department: trimmed(self.department.clone()).unwrap_or_else(|| "Unknown".to_string()),
            gpa: self.gpa.filter(|v| v.is_finite()).unwrap_or(0.0),
            attendance: self.attendance.filter(|v| v.is_finite()).unwrap_or(0.0),
            activity_score: self.activity_score.filter(|v| v.is_finite()).unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ComponentPatch {
    pub assignment: Option<f64>,
    pub test: Option<f64>,
    pub project: Option<f64>,
    pub quiz: Option<f64>,
}

impl ComponentPatch {
    pub fn apply(&self, current: Components) -> ApiResult<Components> {
        let next = Components {
            assignment: self.assignment.unwrap_or(current.assignment),
            test: self.test.unwrap_or(current.test),
            project: self.project.unwrap_or(current.project),
            quiz: self.quiz.unwrap_or(current.quiz),
        };
        next.validate()?;
        Ok(next)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ScorePatch {
    pub marks: Option<f64>,
    #[serde(rename = "maxMarks")]
    pub max_marks: Option<f64>,
    pub name: Option<String>,
}

impl ScorePatch {
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(m) = self.marks {
            if check_number("marks", m)? < 0.0 {
                return Err(ApiError::bad_params("marks must not be negative"));
            }
        }
        if let Some(m) = self.max_marks {
            if check_number("maxMarks", m)? < 0.0 {
                return Err(ApiError::bad_params("maxMarks must not be negative"));
            }
        }
        if let Some(n) = &self.name {
            if n.trim().is_empty() {
                return Err(ApiError::bad_params("name must not be empty"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CatalogCreate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}
