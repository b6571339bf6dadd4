use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Analytics paths only ever look at the head of the dataset.
pub const ROW_CAP: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    pub fn parse(raw: &str) -> Option<Grade> {
        match raw.trim() {
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            "F" => Some(Grade::F),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn is_pass(self) -> bool {
        self != Grade::F
    }
}

/// One row of the performance dataset. Numeric columns that were absent or
/// unparsable are `None`.
#[derive(Debug, Clone, Default)]
pub struct StudentRecord {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub attendance: Option<f64>,
    pub midterm_score: Option<f64>,
    pub final_score: Option<f64>,
    pub assignments_avg: Option<f64>,
    pub quizzes_avg: Option<f64>,
    pub participation_score: Option<f64>,
    pub projects_score: Option<f64>,
    pub total_score: Option<f64>,
    pub grade: Option<Grade>,
    pub study_hours_per_week: Option<f64>,
    pub stress_level: Option<f64>,
    pub sleep_hours_per_night: Option<f64>,
    pub age: Option<f64>,
    pub extracurricular: bool,
    pub internet_access: bool,
}

impl StudentRecord {
    /// Department label usable for grouping; blanks and the `-` placeholder
    /// are treated as absent.
    pub fn group_department(&self) -> Option<&str> {
        match self.department.as_deref().map(str::trim) {
            None | Some("") | Some("-") => None,
            Some(d) => Some(d),
        }
    }
}

/// Parse-or-null coercion for numeric cells.
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    let t = raw?.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_flag(raw: Option<&str>) -> bool {
    raw.map(|s| s.trim() == "Yes").unwrap_or(false)
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut map = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            map.entry(h.trim().to_string()).or_insert(i);
        }
        Columns(map)
    }

    fn get<'r>(&self, row: &'r csv::StringRecord, name: &str) -> Option<&'r str> {
        self.0.get(name).and_then(|i| row.get(*i))
    }

    fn num(&self, row: &csv::StringRecord, name: &str) -> Option<f64> {
        parse_number(self.get(row, name))
    }
}

fn record_from_row(cols: &Columns, row: &csv::StringRecord) -> StudentRecord {
    StudentRecord {
        student_id: cols.get(row, "Student_ID").unwrap_or("").trim().to_string(),
        first_name: cols.get(row, "First_Name").unwrap_or("").trim().to_string(),
        last_name: cols.get(row, "Last_Name").unwrap_or("").trim().to_string(),
        email: non_empty(cols.get(row, "Email")),
        department: non_empty(cols.get(row, "Department")),
        attendance: cols.num(row, "Attendance (%)"),
        midterm_score: cols.num(row, "Midterm_Score"),
        final_score: cols.num(row, "Final_Score"),
        assignments_avg: cols.num(row, "Assignments_Avg"),
        quizzes_avg: cols.num(row, "Quizzes_Avg"),
        participation_score: cols.num(row, "Participation_Score"),
        projects_score: cols.num(row, "Projects_Score"),
        total_score: cols.num(row, "Total_Score"),
        grade: cols.get(row, "Grade").and_then(Grade::parse),
        study_hours_per_week: cols.num(row, "Study_Hours_per_Week"),
        stress_level: cols.num(row, "Stress_Level (1-10)"),
        sleep_hours_per_night: cols.num(row, "Sleep_Hours_per_Night"),
        age: cols.num(row, "Age"),
        extracurricular: parse_flag(cols.get(row, "Extracurricular_Activities")),
        internet_access: parse_flag(cols.get(row, "Internet_Access_at_Home")),
    }
}

/// Reads up to `cap` rows from a headered CSV. Rows the reader rejects
/// (ragged field counts, invalid UTF-8) are skipped rather than failing the
/// whole load.
pub fn load_dataset(path: &Path, cap: usize) -> anyhow::Result<Vec<StudentRecord>> {
    let file = File::open(path)?;
    read_dataset(file, cap)
}

pub fn read_dataset<R: std::io::Read>(reader: R, cap: usize) -> anyhow::Result<Vec<StudentRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);
    let cols = Columns::from_headers(rdr.headers()?);

    let mut out = Vec::new();
    for result in rdr.records() {
        if out.len() >= cap {
            break;
        }
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("skipping malformed dataset row: {}", e);
                continue;
            }
        };
        out.push(record_from_row(&cols, &row));
    }
    Ok(out)
}
