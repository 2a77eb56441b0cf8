//! Role-scoped entry points. A session is opened once for the acting user
//! and exposes only the operations that role may perform: teachers edit
//! grades and look at class statistics, students read their own results.
//!
//! Sessions hold identity only. The store handle is passed to every call.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::calc::{self, RankInfo, Standing};
use crate::db;
use crate::error::GradebookError;
use crate::models::{Grade, GradeEntry, NewGrade, Student, Teacher};
use crate::report::{render_report, ReportInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Session {
    Teacher(TeacherSession),
    Student(StudentSession),
}

impl Session {
    /// Resolve `user_id` to a role. Teacher accounts are checked first.
    pub fn open(conn: &Connection, user_id: &str) -> Result<Session> {
        if let Some(teacher) = db::find_teacher(conn, user_id)? {
            debug!(user_id, "teacher session opened");
            return Ok(Session::Teacher(TeacherSession { teacher }));
        }
        if let Some(student) = db::find_student(conn, user_id)? {
            debug!(user_id, "student session opened");
            return Ok(Session::Student(StudentSession { student }));
        }
        Err(GradebookError::UnknownUser(user_id.to_string()).into())
    }

    pub fn role(&self) -> Role {
        match self {
            Session::Teacher(_) => Role::Teacher,
            Session::Student(_) => Role::Student,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Session::Teacher(session) => session.teacher.to_string(),
            Session::Student(session) => session.student.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub subject: String,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStudent {
    #[serde(flatten)]
    pub standing: Standing,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TeacherSession {
    teacher: Teacher,
}

impl TeacherSession {
    pub fn teacher(&self) -> &Teacher {
        &self.teacher
    }

    pub fn add_grade(&self, conn: &Connection, grade: &NewGrade) -> Result<Grade> {
        db::add_grade(conn, grade)
    }

    pub fn update_grade(
        &self,
        conn: &Connection,
        grade_id: i64,
        value: f64,
        weight: Option<f64>,
    ) -> Result<()> {
        db::update_grade(conn, grade_id, value, weight)
    }

    pub fn delete_grade(&self, conn: &Connection, grade_id: i64) -> Result<()> {
        db::delete_grade(conn, grade_id)
    }

    pub fn search_students(&self, conn: &Connection, fragment: &str) -> Result<Vec<Student>> {
        db::search_students(conn, fragment)
    }

    /// Weighted average of a whole class in one subject, `None` without data.
    pub fn class_subject_average(
        &self,
        conn: &Connection,
        class_id: i64,
        subject_id: i64,
    ) -> Result<Option<f64>> {
        let grades = db::grades_for_class_subject(conn, class_id, subject_id)?;
        Ok(calc::class_subject_average(&grades))
    }

    /// Full class table, best average first. Empty for an unknown class.
    pub fn class_ranking(&self, conn: &Connection, class_id: i64) -> Result<Vec<RankedStudent>> {
        let students = db::students_in_class(conn, class_id)?;
        let grades = calc::group_by_student(db::grades_for_class(conn, class_id)?);
        let standings = calc::class_standings(&students, &grades);

        Ok(standings
            .into_iter()
            .map(|standing| {
                let name = students
                    .iter()
                    .find(|s| s.id == standing.student_id)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                RankedStudent { standing, name }
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct StudentSession {
    student: Student,
}

impl StudentSession {
    pub fn student(&self) -> &Student {
        &self.student
    }

    /// Grade history, newest first.
    pub fn grades(&self, conn: &Connection) -> Result<Vec<GradeEntry>> {
        db::grade_entries_for_student(conn, &self.student.id)
    }

    pub fn overall_average(&self, conn: &Connection) -> Result<Option<f64>> {
        let grades = db::grades_for_student(conn, &self.student.id)?;
        Ok(calc::overall_average(&grades))
    }

    /// Averages per subject, labelled and ordered by subject name.
    pub fn subject_averages(&self, conn: &Connection) -> Result<Vec<SubjectAverage>> {
        let grades = db::grades_for_student(conn, &self.student.id)?;
        let averages = calc::subject_averages(&grades);
        let subjects = db::fetch_subjects(conn)?;

        Ok(subjects
            .into_iter()
            .filter_map(|subject| {
                averages.get(&subject.id).map(|&average| SubjectAverage {
                    subject: subject.name,
                    average,
                })
            })
            .collect())
    }

    pub fn rank(&self, conn: &Connection) -> Result<RankInfo> {
        student_rank(conn, &self.student.id)
    }

    pub fn report(&self, conn: &Connection) -> Result<String> {
        student_report(conn, &self.student)
    }
}

/// Rank of a student inside their class. Unknown students and empty classes
/// yield [`RankInfo::NOT_COMPUTABLE`] rather than an error.
pub fn student_rank(conn: &Connection, student_id: &str) -> Result<RankInfo> {
    let Some(student) = db::find_student(conn, student_id)? else {
        debug!(student_id, "rank requested for unknown student");
        return Ok(RankInfo::NOT_COMPUTABLE);
    };

    let classmates = db::students_in_class(conn, student.class_id)?;
    let grades = calc::group_by_student(db::grades_for_class(conn, student.class_id)?);
    let info = calc::class_rank(student_id, &classmates, &grades);
    debug!(
        student_id,
        rank = info.rank,
        class_size = info.class_size,
        average = info.average,
        "rank computed"
    );
    Ok(info)
}

/// Load everything a report card needs and render it.
pub fn student_report(conn: &Connection, student: &Student) -> Result<String> {
    let grades = db::grades_for_student(conn, &student.id)?;
    let subjects = db::fetch_subjects(conn)?;
    let class = db::find_class(conn, student.class_id)?;
    let rank = student_rank(conn, &student.id)?;

    Ok(render_report(&ReportInput {
        student,
        class_name: class.as_ref().map(|c| c.name.as_str()),
        subjects: &subjects,
        grades: &grades,
        rank,
    }))
}
