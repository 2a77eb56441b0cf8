//! Command dispatch: open the store, resolve the acting user to a session
//! and run the subcommand if that role is allowed to.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use gradebook::calc::NOMINAL_SCALE;
use gradebook::db;
use gradebook::error::GradebookError;
use gradebook::models::{format_date, NewGrade};
use gradebook::report::report_file_name;
use gradebook::session::{Session, StudentSession, TeacherSession};

use crate::cli::{Cli, Commands, OutputFormat};

pub fn run(cli: &Cli) -> Result<()> {
    let path = match &cli.db {
        Some(path) => path.clone(),
        None => db::default_db_path()?,
    };
    let conn = db::open_store(&path)?;

    if let Commands::Init { seed } = &cli.command {
        return init(&conn, &path, *seed, cli.format);
    }

    let user = cli.user.as_deref().ok_or(GradebookError::MissingUser)?;
    let session = Session::open(&conn, user)?;
    debug!(user, role = session.role().as_str(), "dispatching command");

    match &session {
        Session::Teacher(teacher) => run_teacher(&conn, teacher, cli),
        Session::Student(student) => run_student(&conn, student, cli),
    }
}

fn init(conn: &Connection, path: &Path, seed: bool, format: OutputFormat) -> Result<()> {
    if seed {
        db::seed_demo_data(conn)?;
    }
    emit(
        format,
        &json!({ "database": path, "seeded": seed }),
        || {
            println!("Initialized gradebook at {}", path.display());
            if seed {
                println!("Demo classes, subjects and accounts added.");
            }
        },
    )
}

fn run_teacher(conn: &Connection, teacher: &TeacherSession, cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::AddGrade {
            student,
            subject,
            value,
            weight,
            date,
        } => {
            let grade = teacher.add_grade(
                conn,
                &NewGrade {
                    student_id: student.clone(),
                    subject_id: *subject,
                    value: *value,
                    weight: *weight,
                    date: date.unwrap_or_else(|| Local::now().date_naive()),
                },
            )?;
            emit(cli.format, &grade, || {
                println!(
                    "Recorded grade #{}: {} (weight {}) for student {} on {}.",
                    grade.id,
                    grade.value,
                    grade.weight,
                    grade.student_id,
                    format_date(grade.date)
                );
            })
        }
        Commands::UpdateGrade { id, value, weight } => {
            teacher.update_grade(conn, *id, *value, *weight)?;
            let grade = db::find_grade(conn, *id)?
                .ok_or_else(|| GradebookError::not_found("grade", id))?;
            emit(cli.format, &grade, || {
                println!(
                    "Updated grade #{}: {} (weight {}).",
                    grade.id, grade.value, grade.weight
                );
            })
        }
        Commands::DeleteGrade { id } => {
            teacher.delete_grade(conn, *id)?;
            emit(cli.format, &json!({ "deleted": id }), || {
                println!("Deleted grade #{id}.");
            })
        }
        Commands::Search { name } => {
            let students = teacher.search_students(conn, name)?;
            emit(cli.format, &students, || {
                if students.is_empty() {
                    println!("No student matches {name:?}.");
                }
                for s in &students {
                    println!(
                        "ID: {} | Name: {} | First name: {} | Class: {}",
                        s.id, s.last_name, s.first_name, s.class_id
                    );
                }
            })
        }
        Commands::ClassAverage { class, subject } => {
            let average = teacher.class_subject_average(conn, *class, *subject)?;
            let payload = json!({ "class_id": class, "subject_id": subject, "average": average });
            emit(cli.format, &payload, || match average {
                Some(avg) => println!("Class weighted average: {avg:.2}/{NOMINAL_SCALE:.0}"),
                None => println!("No data available for this class and subject."),
            })
        }
        Commands::Ranking { class } => {
            let table = teacher.class_ranking(conn, *class)?;
            emit(cli.format, &table, || {
                if table.is_empty() {
                    println!("No students in class {class}.");
                }
                for row in &table {
                    let average = if row.standing.graded {
                        format!("{:.2}", row.standing.average)
                    } else {
                        "n/a".to_string()
                    };
                    println!(
                        "{:>3}. {:<30} {:>6}",
                        row.standing.rank, row.name, average
                    );
                }
            })
        }
        other => Err(GradebookError::NotPermitted {
            role: "teacher",
            action: other.action(),
        }
        .into()),
    }
}

fn run_student(conn: &Connection, student: &StudentSession, cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Grades => {
            let entries = student.grades(conn)?;
            emit(cli.format, &entries, || {
                if entries.is_empty() {
                    println!("No grades yet.");
                }
                for e in &entries {
                    println!(
                        "[{}] {:<12} : {:>5}/{NOMINAL_SCALE:.0} (weight {})",
                        format_date(e.date),
                        e.subject,
                        e.value,
                        e.weight
                    );
                }
            })
        }
        Commands::Average => {
            let overall = student.overall_average(conn)?;
            let subjects = student.subject_averages(conn)?;
            let payload = json!({ "overall": overall, "subjects": &subjects });
            emit(cli.format, &payload, || match overall {
                Some(avg) => {
                    println!("Overall weighted average: {avg:.2}/{NOMINAL_SCALE:.0}");
                    for s in &subjects {
                        println!("  {:<12} {:>6.2}", s.subject, s.average);
                    }
                }
                None => println!("No grades yet."),
            })
        }
        Commands::Rank => {
            let info = student.rank(conn)?;
            let payload = json!({
                "rank": info.rank,
                "class_size": info.class_size,
                "average": info.average,
                "computable": info.is_computable(),
            });
            emit(cli.format, &payload, || {
                if info.is_computable() {
                    println!(
                        "Rank: {} / {} (average {:.2})",
                        info.rank, info.class_size, info.average
                    );
                } else {
                    println!("Rank not available.");
                }
            })
        }
        Commands::Report { write } => {
            let text = student.report(conn)?;
            let file_name = report_file_name(student.student());
            match write {
                Some(dir) => {
                    let target = write_report(dir, &file_name, &text)?;
                    emit(cli.format, &json!({ "path": &target }), || {
                        println!("Report written to {}", target.display());
                    })
                }
                None => emit(
                    cli.format,
                    &json!({ "file_name": &file_name, "text": &text }),
                    || print!("{text}"),
                ),
            }
        }
        other => Err(GradebookError::NotPermitted {
            role: "student",
            action: other.action(),
        }
        .into()),
    }
}

fn write_report(dir: &Path, file_name: &str, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory {}", dir.display()))?;
    let target = dir.join(file_name);
    fs::write(&target, text)
        .with_context(|| format!("failed to write report to {}", target.display()))?;
    Ok(target)
}

/// Print `value` as JSON, or run the human renderer.
fn emit<T: Serialize + ?Sized>(format: OutputFormat, value: &T, human: impl FnOnce()) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rendered =
                serde_json::to_string_pretty(value).context("failed to serialize output")?;
            println!("{rendered}");
        }
        OutputFormat::Human => human(),
    }
    Ok(())
}
