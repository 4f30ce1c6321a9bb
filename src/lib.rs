//! # mkvflags
//!
//! Batch-edit default track flags across a directory of Matroska files.
//!
//! `mkvflags` lists the `.mkv` files in a directory and runs an external
//! header editor (MKVToolNix's `mkvpropedit`) once per file with a fixed,
//! ordered list of track property assignments. The container format itself
//! is never parsed; all edits happen inside the editor, in place, without
//! re-encoding.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mkvflags::{
//!     BatchPropertyEditor, EditOptions, ErrorPolicy, FilePattern, Mkvpropedit,
//!     default_directives,
//! };
//!
//! let editor = BatchPropertyEditor::new(
//!     Mkvpropedit::new(),
//!     EditOptions::new().with_policy(ErrorPolicy::FailFast),
//! );
//! let report = editor.run(
//!     "/media/show/season-01",
//!     &FilePattern::new("*.mkv")?,
//!     &default_directives(),
//! )?;
//! for failure in &report.failures {
//!     eprintln!("{}: {}", failure.file.display(), failure.cause);
//! }
//! # Ok::<(), mkvflags::MkvFlagsError>(())
//! ```
//!
//! ## Features
//!
//! - **Fixed directive list** — clear the default flag on the first audio
//!   track, set it on the third audio track and on the first subtitle track
//! - **One invocation per file** — every edit for a file is applied in a
//!   single editor pass
//! - **Deterministic order** — files are processed sorted by name
//! - **Explicit error policy** — [`ErrorPolicy::FailFast`] or
//!   [`ErrorPolicy::BestEffort`]
//! - **Dry run, progress & cancellation** — via [`EditOptions`]
//!
//! ## Requirements
//!
//! [MKVToolNix](https://mkvtoolnix.download/) must be installed and
//! `mkvpropedit` reachable through `PATH`, unless another program is given
//! with [`Mkvpropedit::with_program`].

pub mod directive;
pub mod discovery;
pub mod editor;
pub mod error;
pub mod options;
pub mod progress;
pub mod tool;

pub use directive::{EditDirective, FLAG_DEFAULT, build_arguments, default_directives};
pub use discovery::{DEFAULT_PATTERN, FilePattern, find_matching_files};
pub use editor::{BatchPropertyEditor, FileFailure, RunReport};
pub use error::{MkvFlagsError, ToolFailure};
pub use options::{EditOptions, ErrorPolicy};
pub use progress::{CancellationToken, FileOutcome, ProgressCallback, ProgressInfo};
pub use tool::{MKVPROPEDIT, Mkvpropedit, PropertyEditor};
