//! The external property editor.
//!
//! [`PropertyEditor`] is the seam between the batch loop and the process
//! that actually rewrites a file's headers. [`Mkvpropedit`] drives
//! MKVToolNix's `mkvpropedit`; tests substitute a recording mock.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use mkvflags::{Mkvpropedit, PropertyEditor, default_directives};
//!
//! let editor = Mkvpropedit::new();
//! println!("using {}", editor.version()?);
//! editor
//!     .edit(Path::new("episode.mkv"), &default_directives())
//!     .map_err(|cause| mkvflags::MkvFlagsError::ExternalTool {
//!         file: "episode.mkv".into(),
//!         cause,
//!     })?;
//! # Ok::<(), mkvflags::MkvFlagsError>(())
//! ```

use std::{
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use crate::directive::{EditDirective, build_arguments};
use crate::error::{MkvFlagsError, ToolFailure};

/// Default program name, resolved through `PATH`.
pub const MKVPROPEDIT: &str = "mkvpropedit";

/// Something that can apply an ordered directive list to one file in a
/// single pass.
pub trait PropertyEditor {
    /// Human-readable program name, used in logs and dry-run output.
    fn program(&self) -> String;

    /// Apply every directive to `file`, blocking until done.
    fn edit(&self, file: &Path, directives: &[EditDirective]) -> Result<(), ToolFailure>;

    /// Render the command line that [`edit`](PropertyEditor::edit) would run.
    fn command_line(&self, file: &Path, directives: &[EditDirective]) -> String {
        let mut line = self.program();
        for argument in build_arguments(file, directives) {
            let argument = argument.to_string_lossy();
            line.push(' ');
            if argument.contains(char::is_whitespace) {
                line.push('"');
                line.push_str(&argument);
                line.push('"');
            } else {
                line.push_str(&argument);
            }
        }
        line
    }
}

impl<T: PropertyEditor + ?Sized> PropertyEditor for &T {
    fn program(&self) -> String {
        (**self).program()
    }

    fn edit(&self, file: &Path, directives: &[EditDirective]) -> Result<(), ToolFailure> {
        (**self).edit(file, directives)
    }
}

/// [`PropertyEditor`] backed by the `mkvpropedit` binary.
#[derive(Debug, Clone)]
pub struct Mkvpropedit {
    program: PathBuf,
}

impl Default for Mkvpropedit {
    fn default() -> Self {
        Self::new()
    }
}

impl Mkvpropedit {
    /// Use `mkvpropedit` from `PATH`.
    pub fn new() -> Self {
        Self::with_program(MKVPROPEDIT)
    }

    /// Use a specific binary, e.g. a full path to a bundled MKVToolNix.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check that the editor can be launched and return its version line.
    ///
    /// # Errors
    ///
    /// Returns [`MkvFlagsError::ToolUnavailable`] if the binary cannot be
    /// found or `--version` exits unsuccessfully.
    pub fn version(&self) -> Result<String, MkvFlagsError> {
        let unavailable = |reason: String| MkvFlagsError::ToolUnavailable {
            program: self.program.display().to_string(),
            reason,
        };

        let resolved = which::which(&self.program)
            .map_err(|error| unavailable(format!("{error} (install MKVToolNix)")))?;
        log::debug!("Resolved {} to {}", self.program.display(), resolved.display());

        let output = Command::new(&resolved)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|error| unavailable(error.to_string()))?;

        if !output.status.success() {
            return Err(unavailable(exit_failure(&output).to_string()));
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        Ok(version)
    }

    fn command(&self, file: &Path, directives: &[EditDirective]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(build_arguments(file, directives))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group: a terminal Ctrl-C stops the batch, not the
        // header rewrite in progress.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command
    }
}

impl PropertyEditor for Mkvpropedit {
    fn program(&self) -> String {
        self.program.display().to_string()
    }

    fn edit(&self, file: &Path, directives: &[EditDirective]) -> Result<(), ToolFailure> {
        log::debug!("Running {}", self.command_line(file, directives));

        let output = self
            .command(file, directives)
            .output()
            .map_err(|error| ToolFailure::Launch(error.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(exit_failure(&output))
        }
    }
}

/// Build an [`ToolFailure::Exit`] from a finished process.
///
/// MKVToolNix prints its `Error:` lines on stdout, so stdout is used when
/// stderr is empty.
fn exit_failure(output: &Output) -> ToolFailure {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string()
    } else {
        stderr
    };

    ToolFailure::Exit {
        code: output.status.code(),
        stderr: message,
    }
}
