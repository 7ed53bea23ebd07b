//! Batch processing: one upload and one output file per input.
//!
//! Files are processed sequentially and failures do not stop the batch; every
//! file is attempted, successes are written as they complete, and the caller
//! gets a [`BatchReport`] accounting for all of it. [`BatchReport::check`]
//! turns a partly-failed batch into the aggregate error after the caller has
//! had the chance to print its summary.
//!
//! Output names are derived from input names: the final extension is replaced
//! by the format's (`report.pdf` → `report.md`), and everything lands flat in
//! the output directory regardless of where the input came from.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::api::client::ApiClient;
use crate::api::types::{ParseOptions, ParseRequest};
use crate::error::DocParseError;
use crate::format::{render, OutputFormat};
use crate::progress::BatchProgress;

/// Everything a batch run needs beyond the file list and destination.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub parse: ParseOptions,
    pub format: OutputFormat,
    pub elements_only: bool,
}

/// One file that failed, with the error that stopped it.
#[derive(Debug)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: DocParseError,
}

/// Outcome of a batch run after every file was attempted.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub written: Vec<PathBuf>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.written.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// `Err` listing the failed inputs when any file failed. Successes stay
    /// on disk either way.
    pub fn check(&self) -> Result<(), DocParseError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(DocParseError::BatchFailed {
                failed: self.failures.iter().map(|f| f.input.clone()).collect(),
            })
        }
    }
}

/// Where the rendering of `input` lands: the input's base name with the
/// format's extension, inside `output_dir`.
pub fn output_path(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    output_dir.join(format!("{stem}.{}", format.output_extension()))
}

/// Create `path` (and parents) if it does not exist yet.
pub fn ensure_output_dir(path: &Path) -> Result<(), DocParseError> {
    fs::create_dir_all(path).map_err(|source| DocParseError::OutputDirCreate {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a rendering to `path`, replacing any existing file.
pub fn write_output(path: &Path, contents: &str) -> Result<(), DocParseError> {
    fs::write(path, contents).map_err(|source| DocParseError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse every file in `files` and write one output per input into
/// `output_dir`, reporting per-file events through `progress`.
///
/// Returns `Ok` with the report even when files failed; only setup errors
/// (the output directory being uncreatable) abort the run.
pub async fn process_batch(
    client: &ApiClient,
    files: &[PathBuf],
    output_dir: &Path,
    options: &BatchOptions,
    progress: &dyn BatchProgress,
) -> Result<BatchReport, DocParseError> {
    ensure_output_dir(output_dir)?;

    let mut report = BatchReport {
        total: files.len(),
        ..BatchReport::default()
    };

    progress.on_batch_start(files.len());
    for (idx, file) in files.iter().enumerate() {
        progress.on_file_start(idx + 1, files.len(), file);
        match process_one(client, file, output_dir, options).await {
            Ok(output) => {
                progress.on_file_done(file, &output);
                report.written.push(output);
            }
            Err(error) => {
                warn!("{}: {}", file.display(), error);
                progress.on_file_failed(file, &error);
                report.failures.push(BatchFailure {
                    input: file.clone(),
                    error,
                });
            }
        }
    }
    progress.on_batch_complete(files.len(), report.written.len());

    Ok(report)
}

async fn process_one(
    client: &ApiClient,
    file: &Path,
    output_dir: &Path,
    options: &BatchOptions,
) -> Result<PathBuf, DocParseError> {
    let request = ParseRequest::with_options(file, options.parse.clone());
    let response = client.parse(&request).await?;
    let rendered = render(&response, options.format, options.elements_only)?;
    let output = output_path(file, output_dir, options.format);
    write_output(&output, &rendered)?;
    Ok(output)
}
