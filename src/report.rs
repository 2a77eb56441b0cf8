//! Fixed-width report card ("bulletin") rendering.
//!
//! Rendering is a pure function of its input: no clock, no I/O. Writing the
//! text somewhere is left to the caller, which can use [`report_file_name`]
//! to pick a stable file name.

use std::collections::BTreeMap;

use crate::calc::{self, RankInfo, NOMINAL_SCALE};
use crate::models::{format_date, Grade, Student, Subject};

/// Characters between the two vertical borders.
const INNER_WIDTH: usize = 46;
/// Usable text width once the one-space margins are removed.
const CONTENT_WIDTH: usize = INNER_WIDTH - 2;
const LABEL_WIDTH: usize = 28;
const COUNT_WIDTH: usize = 6;
const AVERAGE_WIDTH: usize = CONTENT_WIDTH - LABEL_WIDTH - COUNT_WIDTH;
const SUMMARY_WIDTH: usize = CONTENT_WIDTH - LABEL_WIDTH;

/// Everything needed to print one student's report card.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub student: &'a Student,
    pub class_name: Option<&'a str>,
    /// Subject catalogue used to label rows; unknown ids fall back to
    /// `Subject #<id>`.
    pub subjects: &'a [Subject],
    pub grades: &'a [Grade],
    pub rank: RankInfo,
}

/// Render the boxed report card. A student with no usable grades gets the
/// "no data" variant, which carries neither averages nor a rank.
pub fn render_report(input: &ReportInput<'_>) -> String {
    let mut lines = Vec::new();
    lines.push(border('╔', '═', '╗'));
    lines.push(row(&format!("{:^CONTENT_WIDTH$}", "REPORT CARD")));
    lines.push(border('╠', '═', '╣'));
    lines.push(row(&format!("Student : {}", input.student)));
    if let Some(class_name) = input.class_name {
        lines.push(row(&format!("Class   : {class_name}")));
    }
    if let Some(born) = input.student.birth_date {
        lines.push(row(&format!("Born    : {}", format_date(born))));
    }
    lines.push(border('╠', '═', '╣'));

    match calc::overall_average(input.grades) {
        Some(overall) => push_grade_section(&mut lines, input, overall),
        None => lines.push(row("No grades recorded.")),
    }

    lines.push(border('╚', '═', '╝'));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn push_grade_section(lines: &mut Vec<String>, input: &ReportInput<'_>, overall: f64) {
    lines.push(row(&format!(
        "{:<LABEL_WIDTH$}{:>COUNT_WIDTH$}{:>AVERAGE_WIDTH$}",
        "Subject", "Grades", "Average"
    )));
    lines.push(border('╟', '─', '╢'));

    for (name, count, average) in subject_rows(input) {
        lines.push(row(&format!(
            "{:<LABEL_WIDTH$}{:>COUNT_WIDTH$}{:>AVERAGE_WIDTH$}",
            fit(&name, LABEL_WIDTH),
            count,
            format!("{average:.2}")
        )));
    }

    lines.push(border('╠', '═', '╣'));
    lines.push(row(&format!(
        "{:<LABEL_WIDTH$}{:>SUMMARY_WIDTH$}",
        "Overall average",
        format!("{overall:.2} / {NOMINAL_SCALE:.0}")
    )));

    let rank = if input.rank.is_computable() {
        format!("{} / {}", input.rank.rank, input.rank.class_size)
    } else {
        "n/a".to_string()
    };
    lines.push(row(&format!(
        "{:<LABEL_WIDTH$}{:>SUMMARY_WIDTH$}",
        "Class rank", rank
    )));
}

/// (subject label, grade count, weighted average), sorted by label then id.
fn subject_rows(input: &ReportInput<'_>) -> Vec<(String, usize, f64)> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for grade in input.grades {
        *counts.entry(grade.subject_id).or_default() += 1;
    }

    let mut rows: Vec<(String, i64, usize, f64)> = calc::subject_averages(input.grades)
        .into_iter()
        .map(|(subject_id, average)| {
            let label = input
                .subjects
                .iter()
                .find(|s| s.id == subject_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| format!("Subject #{subject_id}"));
            let count = counts.get(&subject_id).copied().unwrap_or(0);
            (label, subject_id, count, average)
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    rows.into_iter()
        .map(|(label, _, count, average)| (label, count, average))
        .collect()
}

fn border(left: char, fill: char, right: char) -> String {
    let mut line = String::with_capacity((INNER_WIDTH + 2) * 3);
    line.push(left);
    line.extend(std::iter::repeat(fill).take(INNER_WIDTH));
    line.push(right);
    line
}

fn row(content: &str) -> String {
    format!("║ {:<CONTENT_WIDTH$} ║", fit(content, CONTENT_WIDTH))
}

/// Truncate to `width` characters so padded columns never overflow.
fn fit(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Stable file name for a student's report, e.g.
/// `report-1-martin-lucas.txt`.
pub fn report_file_name(student: &Student) -> String {
    format!(
        "report-{}-{}.txt",
        slug::slugify(&student.id),
        slug::slugify(format!("{} {}", student.last_name, student.first_name))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn lucas() -> Student {
        Student {
            id: "1".into(),
            last_name: "Martin".into(),
            first_name: "Lucas".into(),
            birth_date: NaiveDate::from_ymd_opt(2009, 3, 14),
            class_id: 1,
        }
    }

    fn catalogue() -> Vec<Subject> {
        vec![
            Subject {
                id: 1,
                name: "Maths".into(),
            },
            Subject {
                id: 2,
                name: "NSI".into(),
            },
            Subject {
                id: 3,
                name: "EPS".into(),
            },
        ]
    }

    fn grade(subject_id: i64, value: f64, weight: f64) -> Grade {
        Grade {
            id: 0,
            value,
            weight,
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            student_id: "1".into(),
            subject_id,
        }
    }

    fn sample_grades() -> Vec<Grade> {
        vec![grade(1, 16.0, 2.0), grade(1, 10.0, 1.0), grade(2, 18.0, 4.0)]
    }

    fn rank() -> RankInfo {
        RankInfo {
            rank: 1,
            class_size: 3,
            average: 114.0 / 7.0,
        }
    }

    #[test]
    fn renders_subject_rows_overall_and_rank() {
        let student = lucas();
        let subjects = catalogue();
        let grades = sample_grades();
        let text = render_report(&ReportInput {
            student: &student,
            class_name: Some("T7"),
            subjects: &subjects,
            grades: &grades,
            rank: rank(),
        });

        assert!(text.contains("Student : MARTIN Lucas"));
        assert!(text.contains("Class   : T7"));
        assert!(text.contains("Born    : 14/03/2009"));

        let maths = text.lines().find(|l| l.contains("Maths")).unwrap();
        assert!(maths.contains("14.00"));
        assert!(maths.contains(" 2 "));
        let nsi = text.lines().find(|l| l.contains("NSI")).unwrap();
        assert!(nsi.contains("18.00"));
        assert!(!text.contains("EPS"));

        assert!(text.contains("16.29 / 20"));
        assert!(text.contains("1 / 3"));
    }

    #[test]
    fn every_line_has_the_same_width() {
        let mut student = lucas();
        student.last_name = "De La Fontaine-Saint-Exupéry-Montmorency".into();
        let mut subjects = catalogue();
        subjects[0].name = "Mathématiques expertes et complémentaires".into();
        let grades = sample_grades();

        let text = render_report(&ReportInput {
            student: &student,
            class_name: None,
            subjects: &subjects,
            grades: &grades,
            rank: rank(),
        });

        for line in text.lines() {
            assert_eq!(line.chars().count(), INNER_WIDTH + 2, "line: {line}");
        }
    }

    #[test]
    fn student_without_grades_gets_no_data_variant() {
        let student = lucas();
        let subjects = catalogue();
        let text = render_report(&ReportInput {
            student: &student,
            class_name: Some("T7"),
            subjects: &subjects,
            grades: &[],
            rank: RankInfo {
                rank: 3,
                class_size: 3,
                average: 0.0,
            },
        });

        assert!(text.contains("No grades recorded."));
        assert!(!text.contains("Overall average"));
        assert!(!text.contains("Class rank"));
    }

    #[test]
    fn output_is_deterministic() {
        let student = lucas();
        let subjects = catalogue();
        let grades = sample_grades();
        let input = ReportInput {
            student: &student,
            class_name: Some("T7"),
            subjects: &subjects,
            grades: &grades,
            rank: rank(),
        };
        assert_eq!(render_report(&input), render_report(&input));

        let mut shuffled = grades.clone();
        shuffled.reverse();
        let reordered = ReportInput {
            grades: &shuffled,
            ..input
        };
        assert_eq!(render_report(&input), render_report(&reordered));
    }

    #[test]
    fn sentinel_rank_prints_not_available() {
        let student = lucas();
        let grades = sample_grades();
        let text = render_report(&ReportInput {
            student: &student,
            class_name: None,
            subjects: &[],
            grades: &grades,
            rank: RankInfo::NOT_COMPUTABLE,
        });
        let rank_line = text.lines().find(|l| l.contains("Class rank")).unwrap();
        assert!(rank_line.contains("n/a"));
        assert!(text.contains("Subject #1"));
    }

    #[test]
    fn file_name_is_slugified_identity() {
        let mut student = lucas();
        assert_eq!(report_file_name(&student), "report-1-martin-lucas.txt");
        student.first_name = "Élodie".into();
        assert_eq!(report_file_name(&student), "report-1-martin-elodie.txt");
    }
}
