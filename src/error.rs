//! Error types and exit codes for gradebook.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (database, I/O)
//! - 2: Usage error (malformed input, command issued by the wrong role)
//! - 3: Data error (unknown user, missing record)

use thiserror::Error;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
    Usage = 2,
    Data = 3,
}

impl From<ExitCode> for u8 {
    fn from(code: ExitCode) -> u8 {
        code as u8
    }
}

/// Conditions callers are expected to match on. Everything else (SQLite
/// failures, I/O) travels as a plain `anyhow::Error` with context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradebookError {
    #[error("weight must be a positive number, got {0}")]
    InvalidWeight(f64),

    #[error("grade value must be a finite number, got {0}")]
    InvalidValue(f64),

    #[error("invalid date {0:?} (expected DD/MM/YYYY)")]
    InvalidDate(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("no acting user; pass --as <USER_ID> or set GRADEBOOK_USER")]
    MissingUser,

    #[error("{role} accounts cannot {action}")]
    NotPermitted {
        role: &'static str,
        action: &'static str,
    },
}

impl GradebookError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        GradebookError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            GradebookError::InvalidWeight(_)
            | GradebookError::InvalidValue(_)
            | GradebookError::InvalidDate(_)
            | GradebookError::MissingUser
            | GradebookError::NotPermitted { .. } => ExitCode::Usage,
            GradebookError::NotFound { .. } | GradebookError::UnknownUser(_) => ExitCode::Data,
        }
    }
}

/// Map any error bubbling out of a command to its exit code. Typed errors
/// may sit anywhere in the `anyhow` context chain.
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<GradebookError>())
        .map(GradebookError::exit_code)
        .unwrap_or(ExitCode::Failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn typed_errors_survive_added_context() {
        let err = Err::<(), _>(GradebookError::InvalidWeight(-1.0))
            .context("failed to record grade")
            .unwrap_err();
        assert_eq!(exit_code_for(&err), ExitCode::Usage);

        let err = anyhow::Error::new(GradebookError::not_found("grade", 42))
            .context("failed to delete grade");
        assert_eq!(exit_code_for(&err), ExitCode::Data);
    }

    #[test]
    fn untyped_errors_are_generic_failures() {
        let err = anyhow::anyhow!("disk on fire");
        assert_eq!(exit_code_for(&err), ExitCode::Failure);
    }

    #[test]
    fn messages_name_the_offending_input() {
        assert_eq!(
            GradebookError::not_found("student", "7").to_string(),
            "student not found: 7"
        );
        assert_eq!(
            GradebookError::NotPermitted {
                role: "student",
                action: "record grades"
            }
            .to_string(),
            "student accounts cannot record grades"
        );
    }
}
