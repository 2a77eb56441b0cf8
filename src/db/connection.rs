use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;
use tracing::debug;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".gradebook";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "gradebook.sqlite";

/// Open (creating if needed) the database file at `path` and make sure the
/// schema exists.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database at {}", path.display()))?;
    debug!(path = %path.display(), "opened grade store");
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Private throwaway store, used by tests and dry runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Run the idempotent migrations. The function also toggles
/// `PRAGMA foreign_keys = ON` so every grade keeps pointing at an existing
/// student and subject.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create classes table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create subjects table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers (
            id TEXT PRIMARY KEY,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create teachers table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id TEXT PRIMARY KEY,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            birth_date TEXT,
            class_id INTEGER NOT NULL,
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )
    .context("failed to create students table")?;

    // Dates are stored as ISO text so ORDER BY date is chronological.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            value REAL NOT NULL,
            weight REAL NOT NULL CHECK (weight > 0),
            date TEXT NOT NULL,
            student_id TEXT NOT NULL,
            subject_id INTEGER NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE,
            FOREIGN KEY(subject_id) REFERENCES subjects(id)
        )",
        [],
    )
    .context("failed to create grades table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS grades_by_student ON grades(student_id)",
        [],
    )
    .context("failed to create grades index")?;

    Ok(())
}

/// Resolve the absolute path to the SQLite database inside the user's home.
pub fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}
