//! CLI argument parsing for gradebook.
//!
//! Global flags select the database, the acting user and the output format;
//! each subcommand maps to one session operation.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use gradebook::models::parse_date;

/// Gradebook - weighted grades, class ranks and report cards
#[derive(Parser, Debug)]
#[command(name = "gradebook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite database file (defaults to ~/.gradebook/gradebook.sqlite)
    #[arg(long, global = true, env = "GRADEBOOK_DB")]
    pub db: Option<PathBuf>,

    /// Teacher or student id the command runs as
    #[arg(
        long = "as",
        global = true,
        env = "GRADEBOOK_USER",
        value_name = "USER_ID"
    )]
    pub user: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Explicit log level or filter directive (e.g. `info`, `gradebook=trace`)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database schema
    Init {
        /// Also insert the demo classes, subjects and accounts
        #[arg(long)]
        seed: bool,
    },

    /// Record a grade (teacher)
    AddGrade {
        /// Student id
        #[arg(long)]
        student: String,

        /// Subject id
        #[arg(long)]
        subject: i64,

        /// Mark obtained, out of 20
        #[arg(long, allow_negative_numbers = true)]
        value: f64,

        /// Coefficient of the grade
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        weight: f64,

        /// Date of the assessment as DD/MM/YYYY (defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Change the mark (and optionally the weight) of a grade (teacher)
    UpdateGrade {
        /// Grade id
        id: i64,

        #[arg(long, allow_negative_numbers = true)]
        value: f64,

        #[arg(long, allow_negative_numbers = true)]
        weight: Option<f64>,
    },

    /// Delete a grade (teacher)
    DeleteGrade {
        /// Grade id
        id: i64,
    },

    /// Find students by family name (teacher)
    Search {
        /// Part of the family name
        name: String,
    },

    /// Weighted average of a class in one subject (teacher)
    ClassAverage {
        #[arg(long)]
        class: i64,

        #[arg(long)]
        subject: i64,
    },

    /// Class table ordered by overall average (teacher)
    Ranking {
        #[arg(long)]
        class: i64,
    },

    /// List my grades, newest first (student)
    Grades,

    /// Show my overall and per-subject averages (student)
    Average,

    /// Show my rank in my class (student)
    Rank,

    /// Print my report card (student)
    Report {
        /// Write the report into this directory instead of stdout
        #[arg(long, value_name = "DIR")]
        write: Option<PathBuf>,
    },
}

impl Commands {
    /// Short phrase used in permission errors.
    pub fn action(&self) -> &'static str {
        match self {
            Commands::Init { .. } => "initialize the store",
            Commands::AddGrade { .. } => "record grades",
            Commands::UpdateGrade { .. } => "edit grades",
            Commands::DeleteGrade { .. } => "delete grades",
            Commands::Search { .. } => "search students",
            Commands::ClassAverage { .. } => "view class averages",
            Commands::Ranking { .. } => "view class rankings",
            Commands::Grades => "list personal grades",
            Commands::Average => "view personal averages",
            Commands::Rank => "view a personal rank",
            Commands::Report { .. } => "print a personal report card",
        }
    }
}
