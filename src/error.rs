//! Error types shared across the crate.
//!
//! Handler plumbing uses `anyhow::Result`; the types here are the domain
//! failures the UI distinguishes when it decides what to show the operator.

use std::fmt::{Display, Formatter};
use std::process::Output;

pub use anyhow::Result;

/// Rejected operator input. Nothing on the system has changed when one of
/// these is returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    Empty { what: &'static str },
    InvalidFormat { what: &'static str, value: String },
    ForbiddenChar { what: &'static str, ch: char },
    AlreadyExists { what: &'static str, value: String },
    NotFound { what: &'static str, value: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Empty { what } => write!(f, "{what} must not be empty"),
            ValidationError::InvalidFormat { what, value } => write!(
                f,
                "invalid {what} '{value}': must start with a letter and contain only letters, digits, '_' or '-'"
            ),
            ValidationError::ForbiddenChar { what, ch } => {
                write!(f, "{what} must not contain {ch:?}")
            }
            ValidationError::AlreadyExists { what, value } => {
                write!(f, "{what} '{value}' already exists")
            }
            ValidationError::NotFound { what, value } => write!(f, "{what} '{value}' not found"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// An external command ran but exited unsuccessfully.
#[derive(Clone, Debug)]
pub struct CommandError {
    pub command: String,
    pub status: Option<i32>,
    pub stderr: String,
}

impl CommandError {
    pub fn from_output(command: impl Into<String>, output: &Output) -> Self {
        Self {
            command: command.into(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.stderr.is_empty() {
            match self.status {
                Some(code) => write!(f, "{} returned non-zero status: {}", self.command, code),
                None => write!(f, "{} was terminated by a signal", self.command),
            }
        } else {
            write!(f, "{} failed: {}", self.command, self.stderr)
        }
    }
}

impl std::error::Error for CommandError {}

/// Start-up requirement that is not met; the process exits before any UI.
#[derive(Debug)]
pub struct PreconditionError(pub String);

impl Display for PreconditionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PreconditionError {}
