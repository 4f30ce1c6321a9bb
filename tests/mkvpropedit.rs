//! End-to-end tests of the process-backed editor.
//!
//! A small shell script stands in for `mkvpropedit` so the exact argument
//! vector can be checked. The last test runs against a real MKVToolNix
//! install and returns early when none is present.

#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use mkvflags::{
    BatchPropertyEditor, DEFAULT_PATTERN, EditOptions, ErrorPolicy, FilePattern, MkvFlagsError,
    Mkvpropedit, PropertyEditor, ToolFailure, default_directives,
};

/// Write an executable script that appends its arguments (one line per
/// call) to `calls.log` and exits non-zero for files named `broken.mkv`.
fn fake_editor(directory: &Path) -> PathBuf {
    let log = directory.join("calls.log");
    let script = directory.join("fake-mkvpropedit");
    let body = format!(
        "#!/bin/sh\n\
         if [ \"$1\" = \"--version\" ]; then echo 'mkvpropedit v0.0.0 (fake)'; exit 0; fi\n\
         echo \"$*\" >> '{}'\n\
         case \"$1\" in *broken.mkv) echo 'Error: not a Matroska file'; exit 2;; esac\n\
         exit 0\n",
        log.display()
    );
    fs::write(&script, body).expect("Failed to write fake editor");
    let mut permissions = fs::metadata(&script).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&script, permissions).unwrap();
    script
}

fn logged_calls(directory: &Path) -> Vec<String> {
    fs::read_to_string(directory.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn passes_all_directives_in_one_invocation() {
    let tools = tempfile::tempdir().unwrap();
    let media = tempfile::tempdir().unwrap();
    fs::write(media.path().join("a.mkv"), b"").unwrap();
    fs::write(media.path().join("b.mkv"), b"").unwrap();
    fs::write(media.path().join("c.txt"), b"").unwrap();

    let tool = Mkvpropedit::with_program(fake_editor(tools.path()));
    let editor = BatchPropertyEditor::new(tool, EditOptions::new());
    let report = editor
        .run(
            media.path(),
            &FilePattern::new(DEFAULT_PATTERN).unwrap(),
            &default_directives(),
        )
        .expect("Run should succeed");

    assert!(report.is_success());
    let calls = logged_calls(tools.path());
    assert_eq!(calls.len(), 2);
    let expected_tail = "--edit track:a1 --set flag-default=0 \
                         --edit track:a3 --set flag-default=1 \
                         --edit track:s1 --set flag-default=1";
    assert_eq!(
        calls[0],
        format!("{} {expected_tail}", media.path().join("a.mkv").display())
    );
    assert_eq!(
        calls[1],
        format!("{} {expected_tail}", media.path().join("b.mkv").display())
    );
}

#[test]
fn non_zero_exit_is_reported_with_output() {
    let tools = tempfile::tempdir().unwrap();
    let media = tempfile::tempdir().unwrap();
    fs::write(media.path().join("broken.mkv"), b"").unwrap();
    fs::write(media.path().join("fine.mkv"), b"").unwrap();

    let tool = Mkvpropedit::with_program(fake_editor(tools.path()));
    let editor = BatchPropertyEditor::new(
        tool,
        EditOptions::new().with_policy(ErrorPolicy::FailFast),
    );
    let report = editor
        .run(
            media.path(),
            &FilePattern::new(DEFAULT_PATTERN).unwrap(),
            &default_directives(),
        )
        .unwrap();

    assert_eq!(logged_calls(tools.path()).len(), 1);
    match report.into_result().unwrap_err() {
        MkvFlagsError::ExternalTool { file, cause } => {
            assert!(file.ends_with("broken.mkv"));
            assert_eq!(
                cause,
                ToolFailure::Exit {
                    code: Some(2),
                    stderr: "Error: not a Matroska file".to_string(),
                }
            );
        }
        other => panic!("Expected ExternalTool error, got {other:?}"),
    }
}

#[test]
fn version_reads_first_line() {
    let tools = tempfile::tempdir().unwrap();
    let tool = Mkvpropedit::with_program(fake_editor(tools.path()));
    assert_eq!(tool.version().unwrap(), "mkvpropedit v0.0.0 (fake)");
    assert!(tool.program().ends_with("fake-mkvpropedit"));
}

#[test]
fn real_mkvpropedit_rejects_non_matroska() {
    let tool = Mkvpropedit::new();
    if tool.version().is_err() {
        return;
    }

    let media = tempfile::tempdir().unwrap();
    let path = media.path().join("garbage.mkv");
    fs::write(&path, b"this is not a matroska file").unwrap();

    let result = tool.edit(&path, &default_directives());
    assert!(
        matches!(result, Err(ToolFailure::Exit { .. })),
        "Expected a non-zero exit, got {result:?}",
    );
}
