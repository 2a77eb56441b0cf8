//! Core library surface for the gradebook application.
//!
//! The binary is a thin shell around these modules: `db` reads and writes
//! the SQLite store, `calc` turns grade rows into weighted averages and class
//! ranks, `report` prints the report card, and `session` ties them together
//! per role.
pub mod calc;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod session;

pub use calc::{class_rank, subject_averages, weighted_average, RankInfo, Standing};
pub use error::{ExitCode, GradebookError};
pub use models::{Class, Grade, GradeEntry, NewGrade, Student, Subject, Teacher};
pub use report::{render_report, report_file_name, ReportInput};
pub use session::{Role, Session, StudentSession, TeacherSession};
