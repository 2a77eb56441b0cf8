//! Domain models that mirror the SQLite schema and get passed between the
//! store, the aggregation engine and the report formatter. They stay plain
//! data holders; every computation lives in `calc` and every query in `db`.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::GradebookError;

/// Display format for calendar dates (`DD/MM/YYYY`).
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Parse a user-supplied `DD/MM/YYYY` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, GradebookError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| GradebookError::InvalidDate(raw.to_string()))
}

/// Render a date the way every user-facing surface shows it.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A single weighted assessment result as stored in the `grades` table.
pub struct Grade {
    /// Primary key, used by teachers to edit or delete the grade.
    pub id: i64,
    /// Mark obtained, nominally on a 0-20 scale (not enforced).
    pub value: f64,
    /// Coefficient applied when averaging. Always strictly positive.
    pub weight: f64,
    pub date: NaiveDate,
    pub student_id: String,
    pub subject_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
/// Everything a teacher supplies when recording a new grade. The store
/// assigns the id.
pub struct NewGrade {
    pub student_id: String,
    pub subject_id: i64,
    pub value: f64,
    pub weight: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A grade joined with its subject name, as listed in a student's history.
pub struct GradeEntry {
    pub grade_id: i64,
    pub subject: String,
    pub value: f64,
    pub weight: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A pupil enrolled in exactly one class.
pub struct Student {
    /// Opaque login identifier (the schema stores it as text).
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    /// Optional because older rows were imported without it.
    pub birth_date: Option<NaiveDate>,
    pub class_id: i64,
}

impl fmt::Display for Student {
    /// `MARTIN Lucas`: the family name is upper-cased the way school
    /// documents print it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.last_name.to_uppercase(), self.first_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Staff member allowed to record and edit grades.
pub struct Teacher {
    pub id: String,
    pub last_name: String,
    pub first_name: String,
}

impl fmt::Display for Teacher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}
