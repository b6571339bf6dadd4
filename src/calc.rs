use crate::dataset::{Grade, StudentRecord};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const TOP_N: usize = 10;

/// Composite weights: total score, attendance, participation, projects.
const OVERALL_WEIGHTS: [f64; 4] = [40.0, 30.0, 20.0, 10.0];

pub fn finite(x: f64) -> Option<f64> {
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Rounded, with non-finite values dropped.
pub fn r2(x: Option<f64>) -> Option<f64> {
    x.and_then(finite).map(round2)
}

/// `part / whole * 100`, or 0 for an empty whole.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    if values.len() <= ddof {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    finite((ss / (values.len() - ddof) as f64).sqrt())
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation (n - 1).
    pub std_dev: Option<f64>,
    pub population_std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn of<I>(values: I) -> Summary
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut vals = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        let min = vals.iter().copied().reduce(f64::min);
        let max = vals.iter().copied().reduce(f64::max);
        Summary {
            count: vals.len(),
            mean: mean(&vals),
            std_dev: std_dev(&vals, 1),
            population_std_dev: std_dev(&vals, 0),
            min,
            max,
            median: median(&mut vals),
        }
    }

    pub fn rounded(self) -> Summary {
        Summary {
            count: self.count,
            mean: r2(self.mean),
            median: r2(self.median),
            std_dev: r2(self.std_dev),
            population_std_dev: r2(self.population_std_dev),
            min: r2(self.min),
            max: r2(self.max),
        }
    }
}

pub fn summarize(records: &[StudentRecord], key: impl Fn(&StudentRecord) -> Option<f64>) -> Summary {
    Summary::of(records.iter().map(key)).rounded()
}

#[derive(Debug, Clone)]
pub struct Ranked<'a> {
    pub rank: usize,
    pub record: &'a StudentRecord,
    pub key: f64,
}

/// Highest `key` first. Rows with a missing key are left out; equal keys
/// keep dataset order.
pub fn top_n<'a, F>(records: &'a [StudentRecord], n: usize, key: F) -> Vec<Ranked<'a>>
where
    F: Fn(&StudentRecord) -> Option<f64>,
{
    let mut keyed = records
        .iter()
        .filter_map(|r| key(r).and_then(finite).map(|k| (r, k)))
        .collect::<Vec<_>>();
    keyed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    keyed
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (record, key))| Ranked {
            rank: i + 1,
            record,
            key,
        })
        .collect()
}

pub fn overall_score(r: &StudentRecord) -> Option<f64> {
    let parts = [
        r.total_score?,
        r.attendance?,
        r.participation_score?,
        r.projects_score?,
    ];
    finite(
        parts
            .iter()
            .zip(OVERALL_WEIGHTS.iter())
            .map(|(v, w)| v / 100.0 * w)
            .sum(),
    )
}

pub fn activity_score(r: &StudentRecord) -> Option<f64> {
    finite(r.participation_score? + r.projects_score?)
}

pub fn prize_status(activity: f64) -> &'static str {
    if activity >= 180.0 {
        "Gold"
    } else if activity >= 160.0 {
        "Silver"
    } else {
        "Bronze"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bin {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    /// Whether `max` itself belongs to the bin.
    pub closed: bool,
}

impl Bin {
    const fn open(label: &'static str, min: f64, max: f64) -> Bin {
        Bin {
            label,
            min,
            max,
            closed: false,
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && (v < self.max || (self.closed && v == self.max))
    }
}

pub const SCORE_BINS: [Bin; 6] = [
    Bin {
        label: "90-100",
        min: 90.0,
        max: 100.0,
        closed: true,
    },
    Bin::open("80-90", 80.0, 90.0),
    Bin::open("70-80", 70.0, 80.0),
    Bin::open("60-70", 60.0, 70.0),
    Bin::open("50-60", 50.0, 60.0),
    Bin::open("Below 50", 0.0, 50.0),
];

pub const ATTENDANCE_BINS: [Bin; 6] = [
    Bin {
        label: "90-100%",
        min: 90.0,
        max: 100.0,
        closed: true,
    },
    Bin::open("80-90%", 80.0, 90.0),
    Bin::open("70-80%", 70.0, 80.0),
    Bin::open("60-70%", 60.0, 70.0),
    Bin::open("50-60%", 50.0, 60.0),
    Bin::open("<50%", 0.0, 50.0),
];

/// Counts per bin, each value landing in the first bin that holds it.
pub fn distribute<I>(values: I, bins: &[Bin]) -> Vec<usize>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut counts = vec![0usize; bins.len()];
    for v in values.into_iter().flatten() {
        if let Some(i) = bins.iter().position(|b| b.contains(v)) {
            counts[i] += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeCounts([usize; 5]);

impl GradeCounts {
    pub fn of<'a, I>(records: I) -> GradeCounts
    where
        I: IntoIterator<Item = &'a StudentRecord>,
    {
        let mut counts = [0usize; 5];
        for r in records {
            if let Some(g) = r.grade {
                counts[g as usize] += 1;
            }
        }
        GradeCounts(counts)
    }

    pub fn get(&self, g: Grade) -> usize {
        self.0[g as usize]
    }

    /// Most frequent grade; ties go to the better (alphabetically first) letter.
    pub fn mode(&self) -> Option<Grade> {
        let mut best: Option<(Grade, usize)> = None;
        for g in Grade::ALL {
            let c = self.get(g);
            if c > 0 && best.map(|(_, bc)| c > bc).unwrap_or(true) {
                best = Some((g, c));
            }
        }
        best.map(|(g, _)| g)
    }
}

pub fn pass_count(records: &[&StudentRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.grade.map(Grade::is_pass).unwrap_or(true))
        .count()
}

/// Groups rows by department in first-appearance order, skipping rows
/// without a usable department.
pub fn group_by_department(records: &[StudentRecord]) -> Vec<(String, Vec<&StudentRecord>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&StudentRecord>)> = Vec::new();
    for r in records {
        let Some(dept) = r.group_department() else {
            continue;
        };
        match index.get(dept) {
            Some(&i) => groups[i].1.push(r),
            None => {
                index.insert(dept, groups.len());
                groups.push((dept.to_string(), vec![r]));
            }
        }
    }
    groups
}

fn group_mean(rows: &[&StudentRecord], key: impl Fn(&StudentRecord) -> Option<f64>) -> Option<f64> {
    let vals = rows.iter().filter_map(|r| key(*r)).collect::<Vec<_>>();
    r2(mean(&vals))
}

#[derive(Debug, Clone)]
pub struct DepartmentRollup {
    pub department: String,
    pub student_count: usize,
    pub average_score: Option<f64>,
    pub average_attendance: Option<f64>,
    pub average_participation: Option<f64>,
    pub average_midterm: Option<f64>,
    pub average_final: Option<f64>,
    pub average_assignment: Option<f64>,
    pub average_quiz: Option<f64>,
    pub average_project: Option<f64>,
    pub pass_rate: f64,
    pub fail_count: usize,
    pub modal_grade: Option<Grade>,
    pub top_score: Option<f64>,
    pub bottom_score: Option<f64>,
    pub grades: GradeCounts,
}

pub fn department_rollups(records: &[StudentRecord]) -> Vec<DepartmentRollup> {
    let mut out = group_by_department(records)
        .into_iter()
        .map(|(department, rows)| {
            let total = rows.len();
            let passed = pass_count(&rows);
            let grades = GradeCounts::of(rows.iter().copied());
            let scores = Summary::of(rows.iter().map(|r| r.total_score));
            DepartmentRollup {
                department,
                student_count: total,
                average_score: group_mean(&rows, |r| r.total_score),
                average_attendance: group_mean(&rows, |r| r.attendance),
                average_participation: group_mean(&rows, |r| r.participation_score),
                average_midterm: group_mean(&rows, |r| r.midterm_score),
                average_final: group_mean(&rows, |r| r.final_score),
                average_assignment: group_mean(&rows, |r| r.assignments_avg),
                average_quiz: group_mean(&rows, |r| r.quizzes_avg),
                average_project: group_mean(&rows, |r| r.projects_score),
                pass_rate: percent(passed, total),
                fail_count: total - passed,
                modal_grade: grades.mode(),
                top_score: r2(scores.max),
                bottom_score: r2(scores.min),
                grades,
            }
        })
        .collect::<Vec<_>>();
    // Departments with no scores sink to the bottom.
    out.sort_by(|a, b| match (a.average_score, b.average_score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    out
}

/// Simulated month-by-month attendance around the observed mean.
pub fn monthly_trend(mean_attendance: Option<f64>) -> Vec<(&'static str, Option<f64>)> {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    MONTHS
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let variation = ((i % 3) as f64 - 1.0) * 2.0;
            let v = mean_attendance.map(|base| round2((base + variation).clamp(50.0, 100.0)));
            (*m, v)
        })
        .collect()
}
