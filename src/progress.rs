//! Progress-callback trait for per-file batch events.
//!
//! [`crate::batch::process_batch`] reports each file's lifecycle through a
//! [`BatchProgress`] reference: implement the methods you care about, the
//! rest default to no-ops. A silent run is just [`NoopBatchProgress`].
//!
//! The library has no opinion about presentation. The `docparse` binary
//! drives a terminal bar from these events; a service embedding the crate
//! could forward them to a channel instead. The trait is `Send + Sync`, and
//! [`BatchProgressHandle`] is the shared form for observers that outlive a
//! single call.
//!
//! # Example
//!
//! ```rust
//! use docparse::BatchProgress;
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingProgress {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgress for CountingProgress {
//!     fn on_file_done(&self, input: &Path, output: &Path) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} -> {}", input.display(), output.display());
//!     }
//! }
//!
//! let progress: Arc<dyn BatchProgress> = Arc::new(CountingProgress {
//!     done: AtomicUsize::new(0),
//! });
//! progress.on_file_done(Path::new("a.pdf"), Path::new("out/a.md"));
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::error::DocParseError;

/// Called by [`crate::batch::process_batch`] as it works through the file
/// list. Files are processed sequentially, so events for one batch never
/// overlap.
pub trait BatchProgress: Send + Sync {
    /// Called once before the first file is processed.
    ///
    /// # Arguments
    /// * `total_files` — number of files in this batch
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is uploaded.
    ///
    /// # Arguments
    /// * `index`       — 1-indexed position in the batch
    /// * `total_files` — number of files in this batch
    /// * `input`       — the file about to be processed
    fn on_file_start(&self, index: usize, total_files: usize, input: &Path) {
        let _ = (index, total_files, input);
    }

    /// Called when a file was parsed and its rendering written to disk.
    ///
    /// # Arguments
    /// * `input`  — the source file
    /// * `output` — the path the rendering was written to
    fn on_file_done(&self, input: &Path, output: &Path) {
        let _ = (input, output);
    }

    /// Called when a file failed; the batch continues with the next file.
    ///
    /// # Arguments
    /// * `input` — the source file
    /// * `error` — what went wrong for this file
    fn on_file_failed(&self, input: &Path, error: &DocParseError) {
        let _ = (input, error);
    }

    /// Called once after every file has been attempted.
    ///
    /// # Arguments
    /// * `total_files`   — number of files in this batch
    /// * `success_count` — files whose output was written
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// Ignores every event. The choice for batch runs that should stay silent.
pub struct NoopBatchProgress;

impl BatchProgress for NoopBatchProgress {}

/// Shared form of the callback, for observers handed to more than one batch.
pub type BatchProgressHandle = Arc<dyn BatchProgress>;
