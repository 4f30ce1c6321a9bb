//! Edit directives and their command-line form.
//!
//! An [`EditDirective`] names one track and one property assignment. A run
//! applies the same ordered list to every file; [`default_directives`]
//! returns the list `mkvflags` ships with.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//!
//! use mkvflags::{EditDirective, build_arguments};
//!
//! let directives = vec![
//!     EditDirective::default_flag("track:a1", false),
//!     EditDirective::default_flag("track:a2", true),
//! ];
//! let args = build_arguments(Path::new("episode.mkv"), &directives);
//! assert_eq!(args.len(), 9);
//! ```

use std::{
    ffi::OsString,
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
};

/// Property name of the Matroska "default track" flag.
pub const FLAG_DEFAULT: &str = "flag-default";

/// One property assignment on one track.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditDirective {
    /// Track selector understood by the editor, e.g. `track:a1`.
    pub track_selector: String,
    /// Property to set, e.g. `flag-default`.
    pub property_name: String,
    /// Value to assign, e.g. `0` or `1`.
    pub property_value: String,
}

impl EditDirective {
    /// Create a directive from its three parts.
    pub fn new(
        track_selector: impl Into<String>,
        property_name: impl Into<String>,
        property_value: impl Into<String>,
    ) -> Self {
        Self {
            track_selector: track_selector.into(),
            property_name: property_name.into(),
            property_value: property_value.into(),
        }
    }

    /// Set or clear the default flag on `track_selector`.
    pub fn default_flag(track_selector: impl Into<String>, enabled: bool) -> Self {
        Self::new(track_selector, FLAG_DEFAULT, if enabled { "1" } else { "0" })
    }

    /// The `name=value` half of the directive.
    pub fn assignment(&self) -> String {
        format!("{}={}", self.property_name, self.property_value)
    }
}

impl Display for EditDirective {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} -> {}={}",
            self.track_selector, self.property_name, self.property_value
        )
    }
}

/// The fixed directive list applied by the `mkvflags` binary.
///
/// Clears the default flag on the first audio track, sets it on the third
/// audio track, and sets it on the first subtitle track.
pub fn default_directives() -> Vec<EditDirective> {
    vec![
        EditDirective::default_flag("track:a1", false),
        EditDirective::default_flag("track:a3", true),
        EditDirective::default_flag("track:s1", true),
    ]
}

/// Build the editor's argument vector for one file.
///
/// Produces `<file> --edit <selector> --set <name>=<value> ...`. Adjacent
/// directives on the same selector share one `--edit`, so the order of
/// assignments is exactly the order of `directives`.
pub fn build_arguments(file: &Path, directives: &[EditDirective]) -> Vec<OsString> {
    let mut args = Vec::with_capacity(1 + directives.len() * 4);
    args.push(file.as_os_str().to_os_string());

    let mut current_selector: Option<&str> = None;
    for directive in directives {
        if current_selector != Some(directive.track_selector.as_str()) {
            args.push("--edit".into());
            args.push(directive.track_selector.clone().into());
            current_selector = Some(&directive.track_selector);
        }
        args.push("--set".into());
        args.push(directive.assignment().into());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn default_list_order() {
        let list = default_directives();
        let rendered: Vec<String> = list.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "track:a1 -> flag-default=0",
                "track:a3 -> flag-default=1",
                "track:s1 -> flag-default=1",
            ]
        );
    }

    #[test]
    fn arguments_for_default_list() {
        let args = build_arguments(Path::new("show/ep01.mkv"), &default_directives());
        assert_eq!(
            strings(&args),
            [
                "show/ep01.mkv",
                "--edit",
                "track:a1",
                "--set",
                "flag-default=0",
                "--edit",
                "track:a3",
                "--set",
                "flag-default=1",
                "--edit",
                "track:s1",
                "--set",
                "flag-default=1",
            ]
        );
    }

    #[test]
    fn adjacent_selectors_share_edit() {
        let directives = vec![
            EditDirective::default_flag("track:s1", true),
            EditDirective::new("track:s1", "flag-forced", "0"),
            EditDirective::default_flag("track:a1", true),
        ];
        let args = strings(&build_arguments(Path::new("x.mkv"), &directives));
        assert_eq!(args.iter().filter(|arg| *arg == "--edit").count(), 2);
        assert_eq!(
            args,
            [
                "x.mkv",
                "--edit",
                "track:s1",
                "--set",
                "flag-default=1",
                "--set",
                "flag-forced=0",
                "--edit",
                "track:a1",
                "--set",
                "flag-default=1",
            ]
        );
    }

    #[test]
    fn non_adjacent_selectors_are_not_merged() {
        let directives = vec![
            EditDirective::default_flag("track:a1", true),
            EditDirective::default_flag("track:a2", false),
            EditDirective::new("track:a1", "language", "eng"),
        ];
        let args = strings(&build_arguments(Path::new("x.mkv"), &directives));
        assert_eq!(args.iter().filter(|arg| *arg == "--edit").count(), 3);
        assert_eq!(args.last().map(String::as_str), Some("language=eng"));
    }
}
