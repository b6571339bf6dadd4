use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;

/// Fixed denominator for component-scored subjects.
pub const DEFAULT_MAX_MARKS: f64 = 100.0;

pub const NOW_SQL: &str = "strftime('%Y-%m-%dT%H:%M:%SZ','now')";

pub fn open_db(path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            department TEXT NOT NULL,
            gpa REAL NOT NULL DEFAULT 0,
            attendance REAL NOT NULL DEFAULT 0,
            activity_score REAL NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at TEXT,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_subjects(
            id INTEGER PRIMARY KEY,
            student_id INTEGER NOT NULL,
            subject_name TEXT NOT NULL,
            marks REAL NOT NULL,
            max_marks REAL NOT NULL DEFAULT 100,
            percentage REAL NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE
        )",
        [],
    )?;
    // Older databases predate the per-component breakdown.
    ensure_student_subjects_components(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_subjects_student ON student_subjects(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_subjects_name ON student_subjects(subject_name)",
        [],
    )?;

    Ok(())
}

fn ensure_student_subjects_components(conn: &Connection) -> anyhow::Result<()> {
    for column in ["assignment", "test", "project", "quiz"] {
        if !table_has_column(conn, "student_subjects", column)? {
            conn.execute(
                &format!(
                    "ALTER TABLE student_subjects ADD COLUMN {} REAL NOT NULL DEFAULT 0",
                    column
                ),
                [],
            )?;
        }
    }
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// The only way a stored percentage is derived.
pub fn score_percentage(marks: f64, max_marks: f64) -> f64 {
    if max_marks > 0.0 && marks.is_finite() && max_marks.is_finite() {
        marks / max_marks * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub department: String,
    pub gpa: f64,
    pub attendance: f64,
    #[serde(rename = "activityScore")]
    pub activity_score: f64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

pub const STUDENT_COLUMNS: &str =
    "id, name, department, gpa, attendance, activity_score, created_at, updated_at";

pub fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        name: r.get(1)?,
        department: r.get(2)?,
        gpa: r.get(3)?,
        attendance: r.get(4)?,
        activity_score: r.get(5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

pub fn student_get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Student>> {
    conn.query_row(
        &format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS),
        [id],
        student_from_row,
    )
    .optional()
}

pub fn student_list(conn: &Connection) -> rusqlite::Result<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM students ORDER BY id",
        STUDENT_COLUMNS
    ))?;
    let rows = stmt.query_map([], student_from_row)?;
    rows.collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectScore {
    pub id: i64,
    pub student_id: i64,
    pub name: String,
    pub marks: f64,
    #[serde(rename = "maxMarks")]
    pub max_marks: f64,
    pub percentage: f64,
    pub assignment: f64,
    pub test: f64,
    pub project: f64,
    pub quiz: f64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

pub const SCORE_COLUMNS: &str = "id, student_id, subject_name, marks, max_marks, percentage,
     assignment, test, project, quiz, created_at, updated_at";

pub fn score_from_row(r: &Row<'_>) -> rusqlite::Result<SubjectScore> {
    Ok(SubjectScore {
        id: r.get(0)?,
        student_id: r.get(1)?,
        name: r.get(2)?,
        marks: r.get(3)?,
        max_marks: r.get(4)?,
        percentage: r.get(5)?,
        assignment: r.get(6)?,
        test: r.get(7)?,
        project: r.get(8)?,
        quiz: r.get(9)?,
        created_at: r.get(10)?,
        updated_at: r.get(11)?,
    })
}

pub fn score_get(conn: &Connection, id: i64) -> rusqlite::Result<Option<SubjectScore>> {
    conn.query_row(
        &format!("SELECT {} FROM student_subjects WHERE id = ?", SCORE_COLUMNS),
        [id],
        score_from_row,
    )
    .optional()
}

pub fn scores_for_student(conn: &Connection, student_id: i64) -> rusqlite::Result<Vec<SubjectScore>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM student_subjects WHERE student_id = ? ORDER BY id",
        SCORE_COLUMNS
    ))?;
    let rows = stmt.query_map([student_id], score_from_row)?;
    rows.collect()
}

pub fn score_list(conn: &Connection) -> rusqlite::Result<Vec<SubjectScore>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM student_subjects ORDER BY id",
        SCORE_COLUMNS
    ))?;
    let rows = stmt.query_map([], score_from_row)?;
    rows.collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSubject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

pub fn catalog_from_row(r: &Row<'_>) -> rusqlite::Result<CatalogSubject> {
    Ok(CatalogSubject {
        id: r.get(0)?,
        name: r.get(1)?,
        description: r.get(2)?,
        created_at: r.get(3)?,
        updated_at: r.get(4)?,
    })
}

pub fn catalog_get(conn: &Connection, id: i64) -> rusqlite::Result<Option<CatalogSubject>> {
    conn.query_row(
        "SELECT id, name, description, created_at, updated_at FROM subjects WHERE id = ?",
        [id],
        catalog_from_row,
    )
    .optional()
}
