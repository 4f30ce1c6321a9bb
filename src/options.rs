//! Run configuration.
//!
//! [`EditOptions`] is a builder that threads the error policy, dry-run mode,
//! progress callbacks and cancellation tokens through
//! [`BatchPropertyEditor`](crate::BatchPropertyEditor) without widening its
//! `run` signature.
//!
//! # Example
//!
//! ```
//! use mkvflags::{CancellationToken, EditOptions, ErrorPolicy};
//!
//! let options = EditOptions::new()
//!     .with_policy(ErrorPolicy::BestEffort)
//!     .with_dry_run(true)
//!     .with_cancellation(CancellationToken::new());
//! assert_eq!(options.policy(), ErrorPolicy::BestEffort);
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// What a run does when the editor fails on a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failure. Files after it are not attempted. This is
    /// the default, matching a shell script run with `set -e`.
    #[default]
    FailFast,
    /// Attempt every file and collect all failures.
    BestEffort,
}

impl Display for ErrorPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ErrorPolicy::FailFast => write!(f, "fail-fast"),
            ErrorPolicy::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// Configuration for a batch run.
#[derive(Clone)]
pub struct EditOptions {
    pub(crate) policy: ErrorPolicy,
    pub(crate) dry_run: bool,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for EditOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("EditOptions")
            .field("policy", &self.policy)
            .field("dry_run", &self.dry_run)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish()
    }
}

impl Default for EditOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl EditOptions {
    /// Defaults: fail-fast, real edits, no progress callback, no cancellation.
    pub fn new() -> Self {
        Self {
            policy: ErrorPolicy::FailFast,
            dry_run: false,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Set the error policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// When `true`, plan every invocation but run none of them.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Attach a progress callback, invoked once per file.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// The token is checked before each file; once cancelled, the remaining
    /// files are reported as not attempted.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The configured error policy.
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Whether this is a dry run.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
