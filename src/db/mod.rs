//! Grade store: persistence split across logical submodules. Every function
//! takes the connection explicitly and runs one statement per unit of work.

mod catalog;
mod connection;
mod grades;
mod students;

pub use catalog::{
    create_class, create_subject, create_teacher, fetch_classes, fetch_subjects, find_class,
    find_teacher, seed_demo_data,
};
pub use connection::{default_db_path, ensure_schema, open_in_memory, open_store};
pub use grades::{
    add_grade, delete_grade, find_grade, grade_entries_for_student, grades_for_class,
    grades_for_class_subject, grades_for_student, update_grade,
};
pub use students::{create_student, find_student, search_students, students_in_class};
