//! Reference data: classes, subjects and teacher accounts. These rows change
//! rarely and are mostly created by `seed_demo_data` or by tests.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::models::{Class, Subject, Teacher};

pub fn fetch_classes(conn: &Connection) -> Result<Vec<Class>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM classes ORDER BY id")
        .context("failed to prepare class query")?;

    let classes = stmt
        .query_map([], |row| {
            Ok(Class {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .context("failed to load classes")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect classes")?;

    Ok(classes)
}

pub fn find_class(conn: &Connection, id: i64) -> Result<Option<Class>> {
    conn.query_row(
        "SELECT id, name FROM classes WHERE id = ?1",
        params![id],
        |row| {
            Ok(Class {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
    .context("failed to load class")
}

pub fn create_class(conn: &Connection, name: &str) -> Result<Class> {
    conn.execute("INSERT INTO classes (name) VALUES (?1)", params![name])
        .context("failed to insert class")?;

    Ok(Class {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

/// Every subject, ordered by name for menus and report rows.
pub fn fetch_subjects(conn: &Connection) -> Result<Vec<Subject>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM subjects ORDER BY name COLLATE NOCASE, id")
        .context("failed to prepare subject query")?;

    let subjects = stmt
        .query_map([], |row| {
            Ok(Subject {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .context("failed to load subjects")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect subjects")?;

    Ok(subjects)
}

pub fn create_subject(conn: &Connection, name: &str) -> Result<Subject> {
    conn.execute("INSERT INTO subjects (name) VALUES (?1)", params![name])
        .context("failed to insert subject")?;

    Ok(Subject {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub(crate) fn subject_exists(conn: &Connection, id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM subjects WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
    .context("failed to check subject")
}

pub fn find_teacher(conn: &Connection, id: &str) -> Result<Option<Teacher>> {
    conn.query_row(
        "SELECT id, last_name, first_name FROM teachers WHERE id = ?1",
        params![id],
        |row| {
            Ok(Teacher {
                id: row.get(0)?,
                last_name: row.get(1)?,
                first_name: row.get(2)?,
            })
        },
    )
    .optional()
    .context("failed to load teacher")
}

pub fn create_teacher(conn: &Connection, teacher: &Teacher) -> Result<()> {
    conn.execute(
        "INSERT INTO teachers (id, last_name, first_name) VALUES (?1, ?2, ?3)",
        params![teacher.id, teacher.last_name, teacher.first_name],
    )
    .context("failed to insert teacher")?;
    Ok(())
}

/// Populate a fresh store with the three terminal classes, the three
/// subjects, one teacher (`p1`) and one student (`1`). Existing rows are
/// left alone, so running it twice is harmless.
pub fn seed_demo_data(conn: &Connection) -> Result<()> {
    for (id, name) in [(1, "T7"), (2, "T8"), (3, "T9")] {
        conn.execute(
            "INSERT OR IGNORE INTO classes (id, name) VALUES (?1, ?2)",
            params![id, name],
        )
        .context("failed to seed classes")?;
    }

    for (id, name) in [(1, "Maths"), (2, "NSI"), (3, "EPS")] {
        conn.execute(
            "INSERT OR IGNORE INTO subjects (id, name) VALUES (?1, ?2)",
            params![id, name],
        )
        .context("failed to seed subjects")?;
    }

    conn.execute(
        "INSERT OR IGNORE INTO teachers (id, last_name, first_name)
         VALUES ('p1', 'Curie', 'Marie')",
        [],
    )
    .context("failed to seed teacher")?;

    conn.execute(
        "INSERT OR IGNORE INTO students (id, last_name, first_name, birth_date, class_id)
         VALUES ('1', 'Martin', 'Lucas', ?1, 1)",
        params![NaiveDate::from_ymd_opt(2009, 3, 14)],
    )
    .context("failed to seed student")?;

    info!("demo data seeded");
    Ok(())
}
