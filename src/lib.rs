//! # docparse
//!
//! Client for the Upstage Document Parse API: convert PDFs, Office
//! documents, and images to HTML, Markdown, or plain text.
//!
//! ## Why this crate?
//!
//! Local PDF-to-text tools fail on scans, complex layouts, and tables.
//! Document Parse runs the heavy lifting server-side — layout analysis, OCR,
//! chart and equation recognition — and returns every rendering at once,
//! along with the per-element structure. This crate is the transport and
//! plumbing around that API: upload, async job tracking, output selection,
//! and batch runs, with nothing parsed locally.
//!
//! ## Flow Overview
//!
//! ```text
//! INPUT (file / dir / glob)
//!  │
//!  ├─ 1. Collect  expand to supported files, reject unsupported up front
//!  ├─ 2. Upload   multipart POST, sync or async submission
//!  ├─ 3. Poll     pending → processing → completed | failed  (async only)
//!  ├─ 4. Render   pick html / markdown / text, or JSON, or element blocks
//!  └─ 5. Write    stdout, one file, or one output per input in a directory
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docparse::{ApiClient, ParseRequest, OutputFormat, render};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key from `docparse config set api-key …` or UPSTAGE_API_KEY
//!     let client = ApiClient::new("up_your_key")?;
//!     let response = client.parse(&ParseRequest::new("document.pdf")).await?;
//!     println!("{}", render(&response, OutputFormat::Markdown, false)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docparse` binary (clap + anyhow + tracing-subscriber) |
//!
//! Library-only consumers can opt out and skip the CLI dependencies:
//! ```toml
//! docparse = { version = "0.4", default-features = false }
//! ```
//!
//! ## Sync or Async?
//!
//! [`ApiClient::parse`] holds the connection open until the document is done
//! — fine for a handful of pages. For large documents submit with
//! [`ApiClient::parse_async`] and come back for the result, or let
//! [`wait_for_result`] poll to completion for you.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod format;
pub mod input;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{
    fetch_completed_result, is_supported_file, wait_for_result, wait_until_terminal, ApiClient,
    ApiClientBuilder, AsyncResponse, Content, Coordinate, Element, JobStatus, OcrStrategy,
    ParseMode, ParseOptions, ParseRequest, ParseResponse, PollOptions, StatusResponse,
    StatusSource, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT,
    DEFAULT_WAIT_TIMEOUT, SUPPORTED_EXTENSIONS,
};
pub use batch::{process_batch, BatchFailure, BatchOptions, BatchReport};
pub use config::{mask_api_key, Config, CONFIG_KEYS, ENV_API_KEY, ENV_CONFIG_PATH};
pub use error::DocParseError;
pub use format::{render, OutputFormat};
pub use input::collect_files;
pub use progress::{BatchProgress, BatchProgressHandle, NoopBatchProgress};
