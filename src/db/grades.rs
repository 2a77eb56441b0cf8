use anyhow::{Context, Result};
use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info};

use crate::calc::{validate_grade, validate_value, validate_weight};
use crate::error::GradebookError;
use crate::models::{Grade, GradeEntry, NewGrade};

use super::catalog::subject_exists;
use super::students::find_student;

const GRADE_COLUMNS: &str = "g.id, g.value, g.weight, g.date, g.student_id, g.subject_id";

fn grade_from_row(row: &Row<'_>) -> rusqlite::Result<Grade> {
    Ok(Grade {
        id: row.get(0)?,
        value: row.get(1)?,
        weight: row.get(2)?,
        date: row.get(3)?,
        student_id: row.get(4)?,
        subject_id: row.get(5)?,
    })
}

/// Record a grade. Input is validated before touching the database, and a
/// dangling student or subject reference comes back as `NotFound`.
pub fn add_grade(conn: &Connection, grade: &NewGrade) -> Result<Grade> {
    validate_grade(grade.value, grade.weight)?;

    conn.execute(
        "INSERT INTO grades (value, weight, date, student_id, subject_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            grade.value,
            grade.weight,
            grade.date,
            grade.student_id,
            grade.subject_id
        ],
    )
    .map_err(|err| map_missing_reference(conn, err, grade))
    .context("failed to insert grade")?;

    let id = conn.last_insert_rowid();
    info!(
        grade_id = id,
        student_id = %grade.student_id,
        subject_id = grade.subject_id,
        value = grade.value,
        weight = grade.weight,
        "grade recorded"
    );

    Ok(Grade {
        id,
        value: grade.value,
        weight: grade.weight,
        date: grade.date,
        student_id: grade.student_id.clone(),
        subject_id: grade.subject_id,
    })
}

/// Change the mark of an existing grade, and its weight when one is given.
pub fn update_grade(conn: &Connection, id: i64, value: f64, weight: Option<f64>) -> Result<()> {
    validate_value(value)?;
    if let Some(weight) = weight {
        validate_weight(weight)?;
    }

    let updated = conn
        .execute(
            "UPDATE grades SET value = ?1, weight = COALESCE(?2, weight) WHERE id = ?3",
            params![value, weight, id],
        )
        .context("failed to update grade")?;

    if updated == 0 {
        return Err(GradebookError::not_found("grade", id).into());
    }
    info!(grade_id = id, value, ?weight, "grade updated");
    Ok(())
}

pub fn delete_grade(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM grades WHERE id = ?1", params![id])
        .context("failed to delete grade")?;

    if deleted == 0 {
        return Err(GradebookError::not_found("grade", id).into());
    }
    info!(grade_id = id, "grade deleted");
    Ok(())
}

pub fn find_grade(conn: &Connection, id: i64) -> Result<Option<Grade>> {
    conn.query_row(
        &format!("SELECT {GRADE_COLUMNS} FROM grades g WHERE g.id = ?1"),
        params![id],
        grade_from_row,
    )
    .optional()
    .context("failed to load grade")
}

/// Every grade of one student, oldest first.
pub fn grades_for_student(conn: &Connection, student_id: &str) -> Result<Vec<Grade>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades g
             WHERE g.student_id = ?1
             ORDER BY g.date, g.id"
        ))
        .context("failed to prepare student grades query")?;

    let grades = stmt
        .query_map(params![student_id], grade_from_row)
        .context("failed to iterate student grades")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect student grades")?;

    debug!(student_id, count = grades.len(), "loaded student grades");
    Ok(grades)
}

/// Grades of every member of a class in one subject. Feeds the class
/// statistic teachers ask for.
pub fn grades_for_class_subject(
    conn: &Connection,
    class_id: i64,
    subject_id: i64,
) -> Result<Vec<Grade>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades g
             INNER JOIN students s ON s.id = g.student_id
             WHERE s.class_id = ?1 AND g.subject_id = ?2
             ORDER BY g.student_id, g.date, g.id"
        ))
        .context("failed to prepare class subject grades query")?;

    let grades = stmt
        .query_map(params![class_id, subject_id], grade_from_row)
        .context("failed to iterate class subject grades")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect class subject grades")?;

    debug!(
        class_id,
        subject_id,
        count = grades.len(),
        "loaded class subject grades"
    );
    Ok(grades)
}

/// All grades of a class across subjects. Ranking needs every classmate's
/// grades at once, so this avoids one query per student.
pub fn grades_for_class(conn: &Connection, class_id: i64) -> Result<Vec<Grade>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades g
             INNER JOIN students s ON s.id = g.student_id
             WHERE s.class_id = ?1
             ORDER BY g.student_id, g.date, g.id"
        ))
        .context("failed to prepare class grades query")?;

    let grades = stmt
        .query_map(params![class_id], grade_from_row)
        .context("failed to iterate class grades")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect class grades")?;

    debug!(class_id, count = grades.len(), "loaded class grades");
    Ok(grades)
}

/// A student's grade history with subject names, newest first.
pub fn grade_entries_for_student(conn: &Connection, student_id: &str) -> Result<Vec<GradeEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT g.id, sub.name, g.value, g.weight, g.date
             FROM grades g
             INNER JOIN subjects sub ON sub.id = g.subject_id
             WHERE g.student_id = ?1
             ORDER BY g.date DESC, g.id DESC",
        )
        .context("failed to prepare grade history query")?;

    let entries = stmt
        .query_map(params![student_id], |row| {
            Ok(GradeEntry {
                grade_id: row.get(0)?,
                subject: row.get(1)?,
                value: row.get(2)?,
                weight: row.get(3)?,
                date: row.get(4)?,
            })
        })
        .context("failed to iterate grade history")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect grade history")?;

    Ok(entries)
}

/// Turn a foreign-key violation into a `NotFound` naming the missing side.
/// Any other SQLite failure passes through untouched.
fn map_missing_reference(conn: &Connection, err: SqlError, grade: &NewGrade) -> anyhow::Error {
    if !matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        return err.into();
    }

    match find_student(conn, &grade.student_id) {
        Ok(None) => return GradebookError::not_found("student", &grade.student_id).into(),
        Ok(Some(_)) => {}
        Err(lookup) => return lookup,
    }
    match subject_exists(conn, grade.subject_id) {
        Ok(false) => GradebookError::not_found("subject", grade.subject_id).into(),
        Ok(true) => err.into(),
        Err(lookup) => lookup,
    }
}
