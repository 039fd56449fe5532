use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a sync run.
///
/// User cancellation is deliberately absent: declining a confirmation is
/// reported through [`crate::script::Outcome::Cancelled`] instead.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("The file is empty: {}", .0.display())]
    EmptyInput(PathBuf),

    #[error("No commits were generated.")]
    NoCommits,

    #[error("`git` not found in PATH.")]
    GitNotFound,

    #[error("git command failed: {0}")]
    Git(String),

    #[error("git command timed out after {0:?}")]
    GitTimeout(Duration),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("script execution failed: {0}")]
    ScriptFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
