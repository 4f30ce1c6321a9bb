//! Error types for the `mkvflags` crate.
//!
//! This module defines [`MkvFlagsError`], the unified error type returned by
//! all fallible operations in the crate, and [`ToolFailure`], the reason a
//! single external editor invocation did not succeed.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    io::Error as IoError,
    path::PathBuf,
};

use thiserror::Error;

/// Why one invocation of the external editor failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolFailure {
    /// The process could not be started (binary missing, permission denied).
    Launch(String),
    /// The process ran and exited unsuccessfully.
    Exit {
        /// Exit code, or `None` when the child was killed by a signal.
        code: Option<i32>,
        /// Captured standard error (trimmed), possibly empty.
        stderr: String,
    },
}

impl Display for ToolFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ToolFailure::Launch(reason) => write!(f, "could not launch editor: {reason}"),
            ToolFailure::Exit { code, stderr } => {
                match code {
                    Some(code) => write!(f, "editor exited with status {code}")?,
                    None => write!(f, "editor terminated by signal")?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
        }
    }
}

/// The unified error type for all `mkvflags` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MkvFlagsError {
    /// The target directory could not be listed.
    #[error("Failed to read directory {path}: {source}")]
    DirectoryRead {
        /// Directory passed to [`crate::BatchPropertyEditor::run`].
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: IoError,
    },

    /// The target path exists but is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },

    /// A run was requested with no edit directives.
    #[error("At least one edit directive is required")]
    EmptyDirectives,

    /// The file name pattern is not a valid glob.
    #[error("Invalid file pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// Pattern as given.
        pattern: String,
        /// Parser message.
        reason: String,
    },

    /// The external editor is missing or does not respond to `--version`.
    #[error("Editor {program} is not available: {reason}")]
    ToolUnavailable {
        /// Program name or path that was checked.
        program: String,
        /// Why the version check failed.
        reason: String,
    },

    /// Editing one file failed.
    #[error("Failed to edit {file}: {cause}")]
    ExternalTool {
        /// File that was being edited.
        file: PathBuf,
        /// What went wrong with the invocation.
        cause: ToolFailure,
    },
}
