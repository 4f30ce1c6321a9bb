//! Locating the files a run will edit.
//!
//! [`FilePattern`] wraps a shell-style glob matched against bare file names,
//! and [`find_matching_files`] lists a directory, keeps every non-directory
//! entry whose name matches, and sorts them by name.

use std::{
    fs,
    path::{Path, PathBuf},
};

use glob::{MatchOptions, Pattern};

use crate::error::MkvFlagsError;

/// Pattern used when none is supplied.
pub const DEFAULT_PATTERN: &str = "*.mkv";

/// A glob matched against a file's name (not its full path).
#[derive(Debug, Clone)]
pub struct FilePattern {
    source: String,
    pattern: Pattern,
}

impl FilePattern {
    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`MkvFlagsError::InvalidPattern`] if the glob is malformed.
    pub fn new(pattern: &str) -> Result<Self, MkvFlagsError> {
        let compiled = Pattern::new(pattern).map_err(|error| MkvFlagsError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: error.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            pattern: compiled,
        })
    }

    /// The pattern as originally written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `file_name` matches. Matching is case-sensitive, like the
    /// shell glob it replaces.
    pub fn matches(&self, file_name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };
        self.pattern.matches_with(file_name, options)
    }
}

/// List entries in `directory` whose names match `pattern`, sorted
/// lexicographically by file name.
///
/// Only entries known to be directories are dropped. Dangling symlinks and
/// entries that cannot be inspected are kept, so the editor reports them as
/// per-file failures. Names that are not valid UTF-8 are matched on their
/// lossy form and returned with their original bytes.
///
/// # Errors
///
/// Returns [`MkvFlagsError::NotADirectory`] if `directory` is a file, and
/// [`MkvFlagsError::DirectoryRead`] if the listing cannot be read.
pub fn find_matching_files(
    directory: &Path,
    pattern: &FilePattern,
) -> Result<Vec<PathBuf>, MkvFlagsError> {
    let read_error = |source| MkvFlagsError::DirectoryRead {
        path: directory.to_path_buf(),
        source,
    };

    if directory.exists() && !directory.is_dir() {
        return Err(MkvFlagsError::NotADirectory {
            path: directory.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let file_name = entry.file_name();
        if !pattern.matches(&file_name.to_string_lossy()) {
            continue;
        }
        // Follows symlinks, so a link to a directory is skipped like the directory.
        let is_dir = fs::metadata(entry.path()).is_ok_and(|metadata| metadata.is_dir());
        if is_dir {
            log::debug!("Skipping directory {}", entry.path().display());
            continue;
        }
        files.push(entry.path());
    }

    files.sort_by(|left, right| left.file_name().cmp(&right.file_name()));
    log::debug!(
        "Found {} file(s) matching {} in {}",
        files.len(),
        pattern.as_str(),
        directory.display()
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_matches_mkv_only() {
        let pattern = FilePattern::new(DEFAULT_PATTERN).unwrap();
        assert!(pattern.matches("a.mkv"));
        assert!(pattern.matches("Show S01E01.mkv"));
        assert!(!pattern.matches("a.mkv.part"));
        assert!(!pattern.matches("a.MKV"));
        assert!(!pattern.matches("c.txt"));
        assert!(!pattern.matches(".hidden.mkv"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let error = FilePattern::new("[").unwrap_err();
        assert!(matches!(error, MkvFlagsError::InvalidPattern { .. }));
    }
}
