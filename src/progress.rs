//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring a batch run,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for per-file progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mkvflags::{
//!     BatchPropertyEditor, CancellationToken, EditOptions, Mkvpropedit, ProgressCallback,
//!     ProgressInfo,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{} {}", info.current, info.total, info.file.display());
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = EditOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_cancellation(token.clone());
//! let editor = BatchPropertyEditor::new(Mkvpropedit::new(), options);
//! # Ok::<(), mkvflags::MkvFlagsError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// Outcome of one file, as seen by a progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The editor succeeded.
    Edited,
    /// Dry run: the command was planned but not executed.
    Planned,
    /// The editor failed.
    Failed,
}

/// A snapshot of batch progress, delivered after each file.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// The file that was just handled.
    pub file: PathBuf,
    /// What happened to it.
    pub outcome: FileOutcome,
    /// How many files have been handled so far, including this one.
    pub current: u64,
    /// Number of matched files in the run.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0).
    pub percentage: f32,
    /// Wall-clock time elapsed since the run started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
}

/// Trait for receiving progress updates during a run.
///
/// Progress callbacks are **infallible** — they observe but cannot halt
/// the run. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called once per file, after the editor returns.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread (or a Ctrl-C
/// handler) to stop the run. The batch loop checks the token before each
/// file, so the file being edited is always allowed to finish.
///
/// # Example
///
/// ```
/// use mkvflags::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal helper that tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: u64,
    current: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one handled file and fire the callback.
    pub(crate) fn advance(&mut self, file: &Path, outcome: FileOutcome) {
        self.current += 1;
        let elapsed = self.start_time.elapsed();

        let percentage = if self.total > 0 {
            (self.current as f32 / self.total as f32) * 100.0
        } else {
            100.0
        };

        let remaining = self.total.saturating_sub(self.current);
        let estimated_remaining = u32::try_from(self.current)
            .ok()
            .zip(u32::try_from(remaining).ok())
            .map(|(done, remaining)| elapsed / done * remaining);

        let info = ProgressInfo {
            file: file.to_path_buf(),
            outcome,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
        };

        self.callback.on_progress(&info);
    }
}
