//! Progress callback and cancellation tests.

use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex},
};

use mkvflags::{
    BatchPropertyEditor, CancellationToken, DEFAULT_PATTERN, EditDirective, EditOptions,
    ErrorPolicy, FileOutcome, FilePattern, ProgressCallback, ProgressInfo, PropertyEditor,
    ToolFailure, default_directives,
};

struct RecordingProgress {
    events: Mutex<Vec<(String, FileOutcome, u64, u64)>>,
}

impl RecordingProgress {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let name = info.file.file_name().unwrap().to_string_lossy().into_owned();
        self.events
            .lock()
            .unwrap()
            .push((name, info.outcome, info.current, info.total));
        assert!(info.percentage > 0.0 && info.percentage <= 100.0);
    }
}

/// Fails on `bad.mkv`; cancels `token` after editing `trigger`.
struct ScriptedEditor {
    token: CancellationToken,
    trigger: &'static str,
    calls: Mutex<Vec<String>>,
}

impl ScriptedEditor {
    fn new(token: CancellationToken, trigger: &'static str) -> Self {
        Self {
            token,
            trigger,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl PropertyEditor for ScriptedEditor {
    fn program(&self) -> String {
        "scripted-editor".to_string()
    }

    fn edit(&self, file: &Path, _directives: &[EditDirective]) -> Result<(), ToolFailure> {
        let name = file.file_name().unwrap().to_string_lossy().into_owned();
        self.calls.lock().unwrap().push(name.clone());
        if name == self.trigger {
            self.token.cancel();
        }
        if name == "bad.mkv" {
            return Err(ToolFailure::Launch("permission denied".to_string()));
        }
        Ok(())
    }
}

fn directory_with(names: &[&str]) -> tempfile::TempDir {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    for name in names {
        fs::write(directory.path().join(name), b"").expect("Failed to write fixture");
    }
    directory
}

fn mkv_pattern() -> FilePattern {
    FilePattern::new(DEFAULT_PATTERN).unwrap()
}

#[test]
fn progress_fires_once_per_file() {
    let directory = directory_with(&["a.mkv", "bad.mkv", "c.mkv"]);
    let progress = RecordingProgress::new();
    let editor = BatchPropertyEditor::new(
        ScriptedEditor::new(CancellationToken::new(), ""),
        EditOptions::new()
            .with_policy(ErrorPolicy::BestEffort)
            .with_progress(progress.clone()),
    );

    editor
        .run(directory.path(), &mkv_pattern(), &default_directives())
        .expect("Run should succeed");

    let events = progress.events.lock().unwrap().clone();
    assert_eq!(
        events,
        [
            ("a.mkv".to_string(), FileOutcome::Edited, 1, 3),
            ("bad.mkv".to_string(), FileOutcome::Failed, 2, 3),
            ("c.mkv".to_string(), FileOutcome::Edited, 3, 3),
        ]
    );
}

#[test]
fn dry_run_reports_planned_outcomes() {
    let directory = directory_with(&["a.mkv", "b.mkv"]);
    let progress = RecordingProgress::new();
    let editor = BatchPropertyEditor::new(
        ScriptedEditor::new(CancellationToken::new(), ""),
        EditOptions::new()
            .with_dry_run(true)
            .with_progress(progress.clone()),
    );

    editor
        .run(directory.path(), &mkv_pattern(), &default_directives())
        .expect("Dry run should succeed");

    let events = progress.events.lock().unwrap();
    assert!(events.iter().all(|(_, outcome, _, _)| *outcome == FileOutcome::Planned));
    assert!(editor.tool().calls.lock().unwrap().is_empty());
}

#[test]
fn cancelled_before_start_attempts_nothing() {
    let directory = directory_with(&["a.mkv", "b.mkv"]);
    let token = CancellationToken::new();
    token.cancel();
    let editor = BatchPropertyEditor::new(
        ScriptedEditor::new(token.clone(), ""),
        EditOptions::new().with_cancellation(token),
    );

    let report = editor
        .run(directory.path(), &mkv_pattern(), &default_directives())
        .expect("Cancelled run still returns a report");

    assert!(report.interrupted);
    assert_eq!(report.processed_count(), 0);
    assert_eq!(report.not_attempted.len(), 2);
    assert!(editor.tool().calls.lock().unwrap().is_empty());
}

#[test]
fn cancellation_lets_current_file_finish() {
    let directory = directory_with(&["a.mkv", "b.mkv", "c.mkv"]);
    let token = CancellationToken::new();
    let editor = BatchPropertyEditor::new(
        ScriptedEditor::new(token.clone(), "a.mkv"),
        EditOptions::new().with_cancellation(token),
    );

    let report = editor
        .run(directory.path(), &mkv_pattern(), &default_directives())
        .expect("Cancelled run still returns a report");

    assert_eq!(*editor.tool().calls.lock().unwrap(), ["a.mkv"]);
    assert_eq!(report.processed_count(), 1);
    assert!(report.interrupted);
    assert_eq!(report.not_attempted.len(), 2);
    assert!(!report.is_success());
    assert_eq!(report.into_result().unwrap(), 1);
}

#[test]
fn options_debug_output() {
    let options = EditOptions::new();
    let debug = format!("{options:?}");
    assert!(debug.contains("EditOptions"));
    assert!(debug.contains("policy: FailFast"));
    assert!(debug.contains("dry_run: false"));
    assert!(debug.contains("has_cancellation: false"));

    let options = options
        .with_policy(ErrorPolicy::BestEffort)
        .with_cancellation(CancellationToken::new());
    let debug = format!("{options:?}");
    assert!(debug.contains("policy: BestEffort"));
    assert!(debug.contains("has_cancellation: true"));
}

#[test]
fn cancellation_token_is_shared_between_clones() {
    let token = CancellationToken::default();
    let clone = token.clone();
    assert!(!clone.is_cancelled());
    token.cancel();
    assert!(clone.is_cancelled());
}
