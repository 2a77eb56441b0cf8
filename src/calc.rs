//! Weighted averages and class ranking.
//!
//! Everything here is a pure function over rows already loaded from the
//! store, so the same inputs always produce the same outputs.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::warn;

use crate::error::GradebookError;
use crate::models::{Grade, Student};

/// Top of the nominal marking scale. Values above it are accepted.
pub const NOMINAL_SCALE: f64 = 20.0;

/// Reject malformed grade input before it reaches the store or any average.
pub fn validate_grade(value: f64, weight: f64) -> Result<(), GradebookError> {
    validate_value(value)?;
    validate_weight(weight)
}

/// Marks must be finite. The 0-20 range is only advisory.
pub fn validate_value(value: f64) -> Result<(), GradebookError> {
    if !value.is_finite() {
        return Err(GradebookError::InvalidValue(value));
    }
    if !(0.0..=NOMINAL_SCALE).contains(&value) {
        warn!(value, "grade value outside the nominal 0-20 scale");
    }
    Ok(())
}

pub fn validate_weight(weight: f64) -> Result<(), GradebookError> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(GradebookError::InvalidWeight(weight));
    }
    Ok(())
}

/// `Σ(value·weight) / Σ(weight)`, or `None` when there is nothing to
/// average (empty input or a weight sum of zero).
pub fn weighted_average<I>(grades: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut sum = 0.0_f64;
    let mut denom = 0.0_f64;
    for (value, weight) in grades {
        sum += value * weight;
        denom += weight;
    }

    if denom > 0.0 {
        Some(sum / denom)
    } else {
        None
    }
}

/// Weighted average across every grade of a student, all subjects pooled.
pub fn overall_average(grades: &[Grade]) -> Option<f64> {
    weighted_average(grades.iter().map(|g| (g.value, g.weight)))
}

/// Class statistic for one subject: the pooled weighted average of every
/// grade the class received in it.
pub fn class_subject_average(grades: &[Grade]) -> Option<f64> {
    overall_average(grades)
}

/// Per-subject weighted averages keyed by subject id. Subjects without a
/// computable average are left out rather than reported as zero.
pub fn subject_averages(grades: &[Grade]) -> BTreeMap<i64, f64> {
    let mut by_subject: BTreeMap<i64, Vec<(f64, f64)>> = BTreeMap::new();
    for grade in grades {
        by_subject
            .entry(grade.subject_id)
            .or_default()
            .push((grade.value, grade.weight));
    }

    by_subject
        .into_iter()
        .filter_map(|(subject_id, pairs)| weighted_average(pairs).map(|avg| (subject_id, avg)))
        .collect()
}

/// Bucket a flat list of grades by owning student.
pub fn group_by_student(grades: Vec<Grade>) -> HashMap<String, Vec<Grade>> {
    let mut grouped: HashMap<String, Vec<Grade>> = HashMap::new();
    for grade in grades {
        grouped.entry(grade.student_id.clone()).or_default().push(grade);
    }
    grouped
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// One row of a class ranking table.
pub struct Standing {
    /// 1-based position.
    pub rank: usize,
    pub student_id: String,
    /// Average used for ordering. A student without grades ranks with 0.
    pub average: f64,
    /// False when `average` is the 0 placeholder for a gradeless student.
    pub graded: bool,
}

/// Order a class by overall average, best first.
///
/// Gradeless students count as 0 so they sink to the bottom instead of
/// dropping out of the table. Equal averages fall back to ascending student
/// id, which keeps the order stable whatever order the rows arrived in.
pub fn class_standings(
    students: &[Student],
    grades_by_student: &HashMap<String, Vec<Grade>>,
) -> Vec<Standing> {
    let mut rows: Vec<(&str, Option<f64>)> = students
        .iter()
        .map(|student| {
            let average = grades_by_student
                .get(&student.id)
                .and_then(|grades| overall_average(grades));
            (student.id.as_str(), average)
        })
        .collect();

    rows.sort_by(|(a_id, a_avg), (b_id, b_avg)| {
        let a_score = a_avg.unwrap_or(0.0);
        let b_score = b_avg.unwrap_or(0.0);
        b_score.total_cmp(&a_score).then_with(|| a_id.cmp(b_id))
    });

    rows.into_iter()
        .enumerate()
        .map(|(idx, (student_id, average))| Standing {
            rank: idx + 1,
            student_id: student_id.to_string(),
            average: average.unwrap_or(0.0),
            graded: average.is_some(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
/// Where a student sits in their class.
pub struct RankInfo {
    pub rank: usize,
    pub class_size: usize,
    pub average: f64,
}

impl RankInfo {
    /// Returned when the student or their class cannot be found. Callers
    /// must test `is_computable` rather than read `rank` as a position.
    pub const NOT_COMPUTABLE: RankInfo = RankInfo {
        rank: 0,
        class_size: 0,
        average: 0.0,
    };

    pub fn is_computable(&self) -> bool {
        self.class_size > 0
    }
}

/// Rank of `student_id` among `classmates` (which should include the
/// student). Yields [`RankInfo::NOT_COMPUTABLE`] for an empty class or a
/// student who is not part of it.
pub fn class_rank(
    student_id: &str,
    classmates: &[Student],
    grades_by_student: &HashMap<String, Vec<Grade>>,
) -> RankInfo {
    if classmates.is_empty() {
        return RankInfo::NOT_COMPUTABLE;
    }

    let standings = class_standings(classmates, grades_by_student);
    standings
        .iter()
        .find(|standing| standing.student_id == student_id)
        .map(|standing| RankInfo {
            rank: standing.rank,
            class_size: standings.len(),
            average: standing.average,
        })
        .unwrap_or(RankInfo::NOT_COMPUTABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const MATHS: i64 = 1;
    const NSI: i64 = 2;
    const EPS: i64 = 3;

    fn grade(student_id: &str, subject_id: i64, value: f64, weight: f64) -> Grade {
        Grade {
            id: 0,
            value,
            weight,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            student_id: student_id.to_string(),
            subject_id,
        }
    }

    fn student(id: &str) -> Student {
        Student {
            id: id.to_string(),
            last_name: format!("Last{id}"),
            first_name: format!("First{id}"),
            birth_date: None,
            class_id: 1,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn weighted_average_matches_closed_form() {
        let samples: Vec<Vec<(f64, f64)>> = vec![
            vec![(12.0, 1.0)],
            vec![(16.0, 2.0), (10.0, 1.0)],
            vec![(0.0, 0.5), (20.0, 3.5), (7.25, 1.0)],
            vec![(13.5, 0.25), (8.0, 4.0), (19.0, 2.0), (11.0, 1.5)],
        ];
        for pairs in samples {
            let num: f64 = pairs.iter().map(|(v, w)| v * w).sum();
            let den: f64 = pairs.iter().map(|(_, w)| w).sum();
            let avg = weighted_average(pairs.clone()).unwrap();
            assert_close(avg, num / den);
        }
    }

    #[test]
    fn weighted_average_is_absent_without_weight() {
        assert_eq!(weighted_average(Vec::new()), None);
        assert_eq!(weighted_average(vec![(15.0, 0.0), (9.0, 0.0)]), None);
    }

    #[test]
    fn subject_and_overall_averages_for_sample_student() {
        let grades = vec![
            grade("s", MATHS, 16.0, 2.0),
            grade("s", MATHS, 10.0, 1.0),
            grade("s", NSI, 18.0, 4.0),
        ];

        let by_subject = subject_averages(&grades);
        assert_eq!(by_subject.len(), 2);
        assert_close(by_subject[&MATHS], 14.0);
        assert_close(by_subject[&NSI], 18.0);
        assert!(!by_subject.contains_key(&EPS));

        assert_close(overall_average(&grades).unwrap(), 114.0 / 7.0);
    }

    #[test]
    fn subject_with_only_zero_weights_is_omitted() {
        let grades = vec![grade("s", MATHS, 12.0, 1.0), grade("s", EPS, 15.0, 0.0)];
        let by_subject = subject_averages(&grades);
        assert_eq!(by_subject.keys().copied().collect::<Vec<_>>(), vec![MATHS]);
    }

    #[test]
    fn best_average_ranks_first() {
        let students = vec![student("a"), student("b"), student("c")];
        let grades = group_by_student(vec![
            grade("a", MATHS, 12.0, 1.0),
            grade("b", MATHS, 16.0, 2.0),
            grade("b", MATHS, 10.0, 1.0),
            grade("b", NSI, 18.0, 4.0),
            grade("c", NSI, 9.5, 2.0),
        ]);

        let info = class_rank("b", &students, &grades);
        assert_eq!(info.rank, 1);
        assert_eq!(info.class_size, 3);
        assert_close(info.average, 114.0 / 7.0);

        assert_eq!(class_rank("a", &students, &grades).rank, 2);
        assert_eq!(class_rank("c", &students, &grades).rank, 3);
    }

    #[test]
    fn gradeless_student_ranks_last_with_zero() {
        let students = vec![student("a"), student("b")];
        let grades = group_by_student(vec![grade("b", MATHS, 4.0, 1.0)]);

        let info = class_rank("a", &students, &grades);
        assert_eq!((info.rank, info.class_size), (2, 2));
        assert_eq!(info.average, 0.0);

        let standings = class_standings(&students, &grades);
        assert!(standings[0].graded);
        assert!(!standings[1].graded);
    }

    #[test]
    fn ties_are_broken_by_student_id() {
        let grades = group_by_student(vec![
            grade("b", MATHS, 14.0, 1.0),
            grade("a", MATHS, 14.0, 1.0),
            grade("c", MATHS, 14.0, 2.0),
        ]);
        let forward = vec![student("a"), student("b"), student("c")];
        let reversed = vec![student("c"), student("b"), student("a")];

        for students in [&forward, &reversed] {
            let order: Vec<_> = class_standings(students, &grades)
                .into_iter()
                .map(|s| s.student_id)
                .collect();
            assert_eq!(order, vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn rank_is_idempotent_and_bounded() {
        let students: Vec<Student> = (1..=6).map(|i| student(&i.to_string())).collect();
        let grades = group_by_student(vec![
            grade("1", MATHS, 11.0, 1.0),
            grade("2", MATHS, 17.0, 3.0),
            grade("3", NSI, 11.0, 2.0),
            grade("4", EPS, 5.5, 1.0),
            grade("5", NSI, 19.0, 1.0),
            grade("5", MATHS, 3.0, 1.0),
        ]);

        let standings = class_standings(&students, &grades);
        for pair in standings.windows(2) {
            assert!(pair[0].average >= pair[1].average);
            if pair[0].average > pair[1].average {
                assert!(pair[0].rank < pair[1].rank);
            }
        }

        for s in &students {
            let first = class_rank(&s.id, &students, &grades);
            let second = class_rank(&s.id, &students, &grades);
            assert_eq!(first, second);
            assert!(first.rank >= 1 && first.rank <= first.class_size);
            assert_eq!(first.class_size, students.len());
        }
    }

    #[test]
    fn unknown_student_or_empty_class_is_not_computable() {
        let students = vec![student("a")];
        let grades = group_by_student(vec![grade("a", MATHS, 10.0, 1.0)]);

        let missing = class_rank("zz", &students, &grades);
        assert_eq!(missing, RankInfo::NOT_COMPUTABLE);
        assert!(!missing.is_computable());

        assert_eq!(class_rank("a", &[], &grades), RankInfo::NOT_COMPUTABLE);
    }

    #[test]
    fn validation_rejects_bad_weights_and_values() {
        assert_eq!(
            validate_grade(12.0, -1.0),
            Err(GradebookError::InvalidWeight(-1.0))
        );
        assert_eq!(
            validate_grade(12.0, 0.0),
            Err(GradebookError::InvalidWeight(0.0))
        );
        assert!(matches!(
            validate_grade(f64::NAN, 1.0),
            Err(GradebookError::InvalidValue(_))
        ));
        assert!(validate_grade(12.0, f64::INFINITY).is_err());
        assert!(validate_grade(25.0, 1.0).is_ok());
    }
}
