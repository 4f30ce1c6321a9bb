//! The batch loop.
//!
//! [`BatchPropertyEditor`] enumerates matching files in one directory and
//! hands each to a [`PropertyEditor`] together with the full directive list,
//! one invocation per file, strictly in sequence.
//!
//! # Example
//!
//! ```no_run
//! use mkvflags::{
//!     BatchPropertyEditor, EditOptions, FilePattern, Mkvpropedit, default_directives,
//! };
//!
//! let editor = BatchPropertyEditor::new(Mkvpropedit::new(), EditOptions::new());
//! let report = editor.run(".", &FilePattern::new("*.mkv")?, &default_directives())?;
//! println!("edited {} file(s)", report.processed_count());
//! report.into_result()?;
//! # Ok::<(), mkvflags::MkvFlagsError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::directive::EditDirective;
use crate::discovery::{FilePattern, find_matching_files};
use crate::error::{MkvFlagsError, ToolFailure};
use crate::options::{EditOptions, ErrorPolicy};
use crate::progress::{FileOutcome, ProgressTracker};
use crate::tool::PropertyEditor;

/// A file the editor failed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// The file.
    pub file: PathBuf,
    /// Why the invocation failed.
    pub cause: ToolFailure,
}

impl From<FileFailure> for MkvFlagsError {
    fn from(failure: FileFailure) -> Self {
        MkvFlagsError::ExternalTool {
            file: failure.file,
            cause: failure.cause,
        }
    }
}

/// What a run did, file by file.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Policy the run used.
    pub policy: ErrorPolicy,
    /// Whether invocations were only planned.
    pub dry_run: bool,
    /// Files the editor succeeded on (or, in a dry run, would have run on).
    pub edited: Vec<PathBuf>,
    /// Files the editor failed on, in the order they were attempted.
    pub failures: Vec<FileFailure>,
    /// Matched files that were never attempted, because of fail-fast or
    /// cancellation.
    pub not_attempted: Vec<PathBuf>,
    /// The run stopped because its cancellation token fired.
    pub interrupted: bool,
}

impl RunReport {
    /// Number of files edited successfully.
    pub fn processed_count(&self) -> usize {
        self.edited.len()
    }

    /// Number of files the run matched.
    pub fn matched_count(&self) -> usize {
        self.edited.len() + self.failures.len() + self.not_attempted.len()
    }

    /// `true` when every matched file was edited.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.not_attempted.is_empty() && !self.interrupted
    }

    /// Convert into `Ok(processed_count)` or the first failure.
    ///
    /// An interrupted run with no failures still yields `Ok` with the count
    /// edited before the interruption; check
    /// [`interrupted`](RunReport::interrupted) to tell the two apart.
    pub fn into_result(self) -> Result<usize, MkvFlagsError> {
        let processed = self.processed_count();
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.into()),
            None => Ok(processed),
        }
    }
}

/// Applies one fixed directive list to every matching file in a directory.
pub struct BatchPropertyEditor<E> {
    tool: E,
    options: EditOptions,
}

impl<E: PropertyEditor> BatchPropertyEditor<E> {
    /// Create a batch editor around `tool`.
    pub fn new(tool: E, options: EditOptions) -> Self {
        Self { tool, options }
    }

    /// The underlying editor.
    pub fn tool(&self) -> &E {
        &self.tool
    }

    /// The run configuration.
    pub fn options(&self) -> &EditOptions {
        &self.options
    }

    /// Files in `directory` that a run with `pattern` would edit, in the
    /// order they would be edited.
    ///
    /// # Errors
    ///
    /// Returns [`MkvFlagsError::DirectoryRead`] or
    /// [`MkvFlagsError::NotADirectory`] when the directory cannot be listed.
    pub fn plan<P: AsRef<Path>>(
        &self,
        directory: P,
        pattern: &FilePattern,
    ) -> Result<Vec<PathBuf>, MkvFlagsError> {
        find_matching_files(directory.as_ref(), pattern)
    }

    /// Edit every file in `directory` whose name matches `pattern`.
    ///
    /// Per-file failures never surface as `Err`; they are recorded in the
    /// returned [`RunReport`] according to the configured [`ErrorPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`MkvFlagsError::EmptyDirectives`] for an empty list, and a
    /// directory error if the listing fails. Both are raised before any
    /// file is touched.
    pub fn run<P: AsRef<Path>>(
        &self,
        directory: P,
        pattern: &FilePattern,
        directives: &[EditDirective],
    ) -> Result<RunReport, MkvFlagsError> {
        if directives.is_empty() {
            return Err(MkvFlagsError::EmptyDirectives);
        }

        let directory = directory.as_ref();
        let files = self.plan(directory, pattern)?;
        log::info!("Editing {} file(s) in {}", files.len(), directory.display());
        self.run_files(files, directives)
    }

    /// Edit exactly `files`, in the order given.
    ///
    /// Used after narrowing a [`plan`](BatchPropertyEditor::plan) down to a
    /// chosen subset. Policy, dry run, progress and cancellation behave as
    /// in [`run`](BatchPropertyEditor::run).
    ///
    /// # Errors
    ///
    /// Returns [`MkvFlagsError::EmptyDirectives`] for an empty list.
    pub fn run_files(
        &self,
        files: Vec<PathBuf>,
        directives: &[EditDirective],
    ) -> Result<RunReport, MkvFlagsError> {
        if directives.is_empty() {
            return Err(MkvFlagsError::EmptyDirectives);
        }

        log::info!(
            "Running {} on {} file(s) ({}{})",
            self.tool.program(),
            files.len(),
            self.options.policy,
            if self.options.dry_run { ", dry run" } else { "" },
        );

        let mut report = RunReport {
            policy: self.options.policy,
            dry_run: self.options.dry_run,
            ..RunReport::default()
        };
        let mut tracker =
            ProgressTracker::new(self.options.progress.clone(), files.len() as u64);

        let mut remaining = files.into_iter();
        while let Some(file) = remaining.next() {
            if self.options.is_cancelled() {
                log::info!("Run cancelled before {}", file.display());
                report.interrupted = true;
                report.not_attempted.push(file);
                report.not_attempted.extend(remaining.by_ref());
                break;
            }

            if self.options.dry_run {
                log::info!("{}", self.tool.command_line(&file, directives));
                tracker.advance(&file, FileOutcome::Planned);
                report.edited.push(file);
                continue;
            }

            match self.tool.edit(&file, directives) {
                Ok(()) => {
                    log::debug!("Edited {}", file.display());
                    tracker.advance(&file, FileOutcome::Edited);
                    report.edited.push(file);
                }
                Err(cause) => {
                    log::info!("Failed to edit {}: {cause}", file.display());
                    tracker.advance(&file, FileOutcome::Failed);
                    report.failures.push(FileFailure { file, cause });
                    if self.options.policy == ErrorPolicy::FailFast {
                        report.not_attempted.extend(remaining.by_ref());
                        break;
                    }
                }
            }
        }

        Ok(report)
    }
}
