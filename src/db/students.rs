use anyhow::{Context, Result};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::info;

use crate::error::GradebookError;
use crate::models::Student;

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        last_name: row.get(1)?,
        first_name: row.get(2)?,
        birth_date: row.get(3)?,
        class_id: row.get(4)?,
    })
}

pub fn find_student(conn: &Connection, id: &str) -> Result<Option<Student>> {
    conn.query_row(
        "SELECT id, last_name, first_name, birth_date, class_id
         FROM students WHERE id = ?1",
        params![id],
        student_from_row,
    )
    .optional()
    .context("failed to load student")
}

/// Members of a class ordered by id. An unknown class simply has no members.
pub fn students_in_class(conn: &Connection, class_id: i64) -> Result<Vec<Student>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, last_name, first_name, birth_date, class_id
             FROM students
             WHERE class_id = ?1
             ORDER BY id",
        )
        .context("failed to prepare class members query")?;

    let students = stmt
        .query_map(params![class_id], student_from_row)
        .context("failed to iterate class members")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect class members")?;

    Ok(students)
}

/// Case-insensitive substring match on the family name, the lookup teachers
/// use before entering a grade.
pub fn search_students(conn: &Connection, fragment: &str) -> Result<Vec<Student>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, last_name, first_name, birth_date, class_id
             FROM students
             WHERE last_name LIKE '%' || ?1 || '%'
             ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE, id",
        )
        .context("failed to prepare student search")?;

    let students = stmt
        .query_map(params![fragment.trim()], student_from_row)
        .context("failed to iterate student search")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect student search")?;

    Ok(students)
}

/// Enrol a student. The class must already exist.
pub fn create_student(conn: &Connection, student: &Student) -> Result<()> {
    conn.execute(
        "INSERT INTO students (id, last_name, first_name, birth_date, class_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            student.id,
            student.last_name,
            student.first_name,
            student.birth_date,
            student.class_id
        ],
    )
    .map_err(|err| {
        if matches!(
            err.sqlite_error_code(),
            Some(ErrorCode::ConstraintViolation)
        ) && !class_exists(conn, student.class_id).unwrap_or(true)
        {
            GradebookError::not_found("class", student.class_id).into()
        } else {
            anyhow::Error::from(err)
        }
    })
    .context("failed to insert student")?;

    info!(student_id = %student.id, class_id = student.class_id, "student enrolled");
    Ok(())
}

fn class_exists(conn: &Connection, class_id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM classes WHERE id = ?1)",
        params![class_id],
        |row| row.get(0),
    )
    .context("failed to check class")
}
