use crate::dataset::{Grade, StudentRecord};

/// At-risk listings are cut off after this many rows.
pub const AT_RISK_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Critical,
    High,
    Medium,
}

impl RiskTier {
    pub fn score(self) -> u32 {
        match self {
            RiskTier::Critical => 100,
            RiskTier::High => 75,
            RiskTier::Medium => 50,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Critical => "Critical",
            RiskTier::High => "High",
            RiskTier::Medium => "Medium",
        }
    }

    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            RiskTier::Critical => &[
                "Immediate intervention required",
                "Increase tutoring hours",
                "Monitor attendance closely",
                "Schedule parent conference",
            ],
            RiskTier::High => &[
                "Provide additional support",
                "Encourage attendance",
                "Review study habits",
                "Consider peer tutoring",
            ],
            RiskTier::Medium => &[
                "Monitor progress closely",
                "Maintain attendance",
                "Continue current support",
                "Encourage study groups",
            ],
        }
    }
}

fn below(v: Option<f64>, limit: f64) -> bool {
    v.map(|x| x < limit).unwrap_or(false)
}

/// First matching rule wins: Critical, then High, then Medium.
/// Missing attendance/score never satisfies a threshold.
pub fn classify(grade: Option<Grade>, attendance: Option<f64>, score: Option<f64>) -> Option<RiskTier> {
    if grade == Some(Grade::F) || (grade == Some(Grade::D) && below(attendance, 70.0)) {
        return Some(RiskTier::Critical);
    }
    if grade == Some(Grade::D) || (grade == Some(Grade::C) && below(attendance, 60.0)) {
        return Some(RiskTier::High);
    }
    if grade == Some(Grade::C) || (below(attendance, 70.0) && below(score, 50.0)) {
        return Some(RiskTier::Medium);
    }
    None
}

pub fn classify_record(r: &StudentRecord) -> Option<RiskTier> {
    classify(r.grade, r.attendance, r.total_score)
}

#[derive(Debug, Clone)]
pub struct AtRisk<'a> {
    pub record: &'a StudentRecord,
    pub tier: RiskTier,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
}

impl RiskCounts {
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium
    }
}

pub fn count_tiers(records: &[StudentRecord]) -> RiskCounts {
    let mut counts = RiskCounts::default();
    for r in records {
        match classify_record(r) {
            Some(RiskTier::Critical) => counts.critical += 1,
            Some(RiskTier::High) => counts.high += 1,
            Some(RiskTier::Medium) => counts.medium += 1,
            None => {}
        }
    }
    counts
}

/// Flagged rows ordered by risk score, highest first. Equal scores keep
/// dataset order.
pub fn at_risk(records: &[StudentRecord]) -> Vec<AtRisk<'_>> {
    let mut flagged = records
        .iter()
        .filter_map(|r| classify_record(r).map(|tier| AtRisk { record: r, tier }))
        .collect::<Vec<_>>();
    flagged.sort_by(|a, b| b.tier.score().cmp(&a.tier.score()));
    flagged.truncate(AT_RISK_LIMIT);
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_grade_is_critical_regardless_of_attendance() {
        let tier = classify(Some(Grade::F), Some(80.0), Some(90.0));
        assert_eq!(tier, Some(RiskTier::Critical));
        assert_eq!(tier.map(|t| t.score()), Some(100));
    }

    #[test]
    fn rule_order_is_first_match() {
        assert_eq!(classify(Some(Grade::D), Some(65.0), None), Some(RiskTier::Critical));
        assert_eq!(classify(Some(Grade::D), Some(75.0), None), Some(RiskTier::High));
        assert_eq!(classify(Some(Grade::C), Some(55.0), Some(80.0)), Some(RiskTier::High));
        assert_eq!(classify(Some(Grade::C), Some(95.0), Some(80.0)), Some(RiskTier::Medium));
        assert_eq!(classify(Some(Grade::B), Some(65.0), Some(45.0)), Some(RiskTier::Medium));
        assert_eq!(classify(Some(Grade::B), Some(65.0), Some(55.0)), None);
        assert_eq!(classify(Some(Grade::A), Some(99.0), Some(99.0)), None);
    }

    #[test]
    fn missing_values_never_trip_thresholds() {
        assert_eq!(classify(Some(Grade::D), None, None), Some(RiskTier::High));
        assert_eq!(classify(Some(Grade::B), None, Some(10.0)), None);
        assert_eq!(classify(None, Some(10.0), None), None);
    }

    #[test]
    fn critical_predicate_never_reports_high() {
        let grades = [None, Some(Grade::A), Some(Grade::B), Some(Grade::C), Some(Grade::D), Some(Grade::F)];
        for g in grades {
            for att in [None, Some(0.0), Some(59.9), Some(60.0), Some(69.9), Some(70.0), Some(100.0)] {
                for score in [None, Some(0.0), Some(49.9), Some(50.0), Some(100.0)] {
                    let critical = g == Some(Grade::F) || (g == Some(Grade::D) && below(att, 70.0));
                    let tier = classify(g, att, score);
                    if critical {
                        assert_eq!(tier, Some(RiskTier::Critical), "{:?} {:?} {:?}", g, att, score);
                    }
                }
            }
        }
    }

    #[test]
    fn at_risk_sorts_by_score_and_keeps_order_on_ties() {
        let mk = |id: &str, grade: Grade, att: f64| StudentRecord {
            student_id: id.into(),
            grade: Some(grade),
            attendance: Some(att),
            total_score: Some(60.0),
            ..Default::default()
        };
        let rows = vec![
            mk("c1", Grade::C, 90.0),
            mk("f1", Grade::F, 90.0),
            mk("a1", Grade::A, 90.0),
            mk("d1", Grade::D, 90.0),
            mk("f2", Grade::F, 90.0),
        ];
        let flagged = at_risk(&rows);
        let ids = flagged.iter().map(|r| r.record.student_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["f1", "f2", "d1", "c1"]);
        let counts = count_tiers(&rows);
        assert_eq!(counts, RiskCounts { critical: 2, high: 1, medium: 1 });
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn listing_stops_at_limit_while_counts_cover_all() {
        let rows = (0..60)
            .map(|i| StudentRecord {
                student_id: format!("s{}", i),
                grade: Some(Grade::F),
                ..Default::default()
            })
            .collect::<Vec<_>>();
        let flagged = at_risk(&rows);
        assert_eq!(flagged.len(), AT_RISK_LIMIT);
        assert_eq!(flagged[49].record.student_id, "s49");
        assert_eq!(count_tiers(&rows).total(), 60);
    }

    #[test]
    fn each_tier_has_four_recommendations() {
        for t in [RiskTier::Critical, RiskTier::High, RiskTier::Medium] {
            assert_eq!(t.recommendations().len(), 4);
        }
    }
}
