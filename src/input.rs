//! Resolve the user's `INPUT` argument into concrete files to upload.
//!
//! Three shapes are accepted: a glob pattern (anything containing `*?[`,
//! expanded before filtering), a single file (which must carry a supported
//! extension), or a directory (scanned flat, or fully with `--recursive`).
//! Pattern and directory scans silently drop unsupported and non-regular
//! entries; only a single named file is strict about its extension, because
//! there the user asked for that exact file.
//!
//! The returned list is sorted, so batch runs process files in a stable
//! order regardless of filesystem enumeration.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::api::types::{is_supported_file, raw_extension};
use crate::error::DocParseError;

/// Expand `input` into the sorted list of supported files it names.
///
/// Errors when the pattern is malformed, the named file is missing or
/// unsupported, a directory scan fails, or the final list is empty.
pub fn collect_files(input: &str, recursive: bool) -> Result<Vec<PathBuf>, DocParseError> {
    let mut files = if input.contains(['*', '?', '[']) {
        collect_glob(input)?
    } else {
        let path = Path::new(input);
        let metadata = fs::metadata(path).map_err(|_| DocParseError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        if metadata.is_dir() {
            collect_dir(path, recursive)?
        } else {
            if !is_supported_file(path) {
                return Err(DocParseError::UnsupportedFormat {
                    extension: raw_extension(path),
                });
            }
            vec![path.to_path_buf()]
        }
    };

    files.sort();
    debug!("collected {} file(s) for input '{}'", files.len(), input);

    if files.is_empty() {
        return Err(DocParseError::NoFilesFound {
            input: input.to_string(),
        });
    }
    Ok(files)
}

fn collect_glob(pattern: &str) -> Result<Vec<PathBuf>, DocParseError> {
    let paths = glob::glob(pattern).map_err(|source| DocParseError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in paths {
        // Entries that can no longer be read are skipped, same as matches
        // that turn out to be directories.
        let Ok(path) = entry else { continue };
        if path.is_file() && is_supported_file(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

fn collect_dir(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, DocParseError> {
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(max_depth) {
        let entry = entry.map_err(|source| DocParseError::DirectoryScan {
            path: dir.to_path_buf(),
            source: source.into(),
        })?;
        if entry.file_type().is_file() && is_supported_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"stub").unwrap();
        path
    }

    #[test]
    fn single_supported_file_passes_through() {
        let tmp = TempDir::new().unwrap();
        let pdf = touch(tmp.path(), "report.pdf");

        let files = collect_files(pdf.to_str().unwrap(), false).unwrap();
        assert_eq!(files, vec![pdf]);
    }

    #[test]
    fn single_unsupported_file_is_rejected_by_extension() {
        let tmp = TempDir::new().unwrap();
        let txt = touch(tmp.path(), "notes.txt");

        let err = collect_files(txt.to_str().unwrap(), false).unwrap_err();
        assert_eq!(err.to_string(), "unsupported file format: .txt");
    }

    #[test]
    fn missing_file_reports_its_path() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.pdf");

        let err = collect_files(missing.to_str().unwrap(), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("file not found: {}", missing.display())
        );
    }

    #[test]
    fn flat_directory_scan_skips_subdirs_and_unsupported() {
        let tmp = TempDir::new().unwrap();
        let a = touch(tmp.path(), "a.pdf");
        let b = touch(tmp.path(), "b.docx");
        touch(tmp.path(), "c.txt");
        fs::create_dir(tmp.path().join("sub")).unwrap();
        touch(&tmp.path().join("sub"), "d.pdf");

        let files = collect_files(tmp.path().to_str().unwrap(), false).unwrap();
        assert_eq!(files, vec![a, b]);
    }

    #[test]
    fn recursive_scan_descends_into_subdirs() {
        let tmp = TempDir::new().unwrap();
        let a = touch(tmp.path(), "a.pdf");
        let b = touch(tmp.path(), "b.docx");
        fs::create_dir(tmp.path().join("sub")).unwrap();
        let d = touch(&tmp.path().join("sub"), "d.pdf");

        let files = collect_files(tmp.path().to_str().unwrap(), true).unwrap();
        assert_eq!(files, vec![a, b, d]);
    }

    #[test]
    fn glob_keeps_only_supported_regular_files() {
        let tmp = TempDir::new().unwrap();
        let one = touch(tmp.path(), "one.pdf");
        let two = touch(tmp.path(), "two.png");
        touch(tmp.path(), "skip.txt");
        fs::create_dir(tmp.path().join("nested")).unwrap();

        let pattern = format!("{}/*", tmp.path().display());
        let files = collect_files(&pattern, false).unwrap();
        assert_eq!(files, vec![one, two]);
    }

    #[test]
    fn glob_without_matches_reports_the_pattern() {
        let tmp = TempDir::new().unwrap();
        let pattern = format!("{}/*.hwp", tmp.path().display());

        let err = collect_files(&pattern, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("no supported files found matching: {pattern}")
        );
    }

    #[test]
    fn empty_directory_reports_no_files() {
        let tmp = TempDir::new().unwrap();
        let err = collect_files(tmp.path().to_str().unwrap(), false).unwrap_err();
        assert!(matches!(err, DocParseError::NoFilesFound { .. }));
    }

    #[test]
    fn malformed_pattern_is_an_error() {
        let err = collect_files("docs/[", false).unwrap_err();
        assert!(matches!(err, DocParseError::InvalidPattern { .. }));
        assert!(err.to_string().starts_with("invalid glob pattern"));
    }
}
