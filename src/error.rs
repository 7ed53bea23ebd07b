//! Error types for the docparse library.
//!
//! One enum, [`DocParseError`], covers every failure mode the library can
//! surface:
//!
//! * **Local validation** — missing files, unsupported extensions, bad glob
//!   patterns, missing API key. Detected before any network call.
//! * **Remote failures** — transport errors, structured API errors
//!   (status + message + type + code), undecodable error bodies, and
//!   malformed success bodies, each a distinct variant so callers can react
//!   differently to "the network is down" and "the server said no".
//! * **Async lifecycle** — a job that the server reports as failed, a wait
//!   that exceeded its deadline (carrying the last observed status and
//!   progress), and a premature result fetch.
//! * **Configuration** — unknown keys and invalid values on `config set`,
//!   plus file-level load/save problems.
//!
//! Batch processing never aborts on the first bad file; per-file errors are
//! collected and reported once at the end via [`DocParseError::BatchFailed`].

use std::path::PathBuf;
use thiserror::Error;

use crate::api::types::JobStatus;

/// All errors returned by the docparse library.
#[derive(Debug, Error)]
pub enum DocParseError {
    // ── Local file errors ─────────────────────────────────────────────────
    /// The input path does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The file extension is not one the API accepts.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    /// The file exists but could not be opened or read for upload.
    #[error("failed to open file '{}': {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory listing or recursive walk failed partway.
    #[error("failed to scan directory '{}': {source}", path.display())]
    DirectoryScan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The glob pattern did not parse.
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Collection finished but nothing usable was found.
    #[error("no supported files found matching: {input}")]
    NoFilesFound { input: String },

    /// No API key in flags, environment, or the config file.
    #[error(
        "API key not set. Set it with 'docparse config set api-key <your-key>' \
         or the UPSTAGE_API_KEY environment variable"
    )]
    MissingApiKey,

    // ── Remote errors ─────────────────────────────────────────────────────
    /// Network-level failure: DNS, connect, TLS, or the per-call timeout.
    #[error("request failed: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    /// Non-success HTTP response with a decodable `{"error": {...}}` body.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        error_type: String,
        code: String,
    },

    /// Non-success HTTP response whose body was not a structured API error.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A 2xx response whose body did not match the expected schema.
    #[error("failed to decode response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    // ── Async lifecycle errors ────────────────────────────────────────────
    /// The server reported the async job as failed.
    #[error("request failed: {message}")]
    JobFailed { message: String },

    /// The wait deadline passed before the job reached a terminal state.
    #[error("timeout waiting for completion (status: {status}, progress: {progress}%)")]
    WaitTimeout { status: JobStatus, progress: u32 },

    /// Result requested for a job that has not completed yet.
    #[error("request not completed (status: {status}). Use --wait to wait for completion")]
    NotCompleted { status: JobStatus },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The requested format name is not one of html/markdown/text/json.
    #[error("unsupported format: {value}")]
    UnknownFormat { value: String },

    /// Serializing a response to JSON output failed.
    #[error("failed to render JSON output: {source}")]
    JsonRender {
        #[source]
        source: serde_json::Error,
    },

    /// Could not create the batch output directory.
    #[error("failed to create output directory '{}': {source}", path.display())]
    OutputDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write a rendered result to disk.
    #[error("failed to write output file '{}': {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more files in a batch run failed; successes were still written.
    #[error("{} files failed to process", failed.len())]
    BatchFailed { failed: Vec<PathBuf> },

    // ── Config errors ─────────────────────────────────────────────────────
    /// `config set`/`get` with a key outside the recognized set.
    #[error("unknown configuration key: {key}")]
    UnknownConfigKey { key: String },

    /// `config set` with a value outside the key's allowed set.
    #[error("invalid {key}: must be {allowed}")]
    InvalidConfigValue {
        key: &'static str,
        allowed: &'static str,
    },

    /// The config file exists but could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file exists but is not valid TOML for [`crate::Config`].
    #[error("failed to parse config file '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The directory that should hold the config file could not be created.
    #[error("failed to create config directory '{}': {source}", path.display())]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be written.
    #[error("failed to write config file '{}': {source}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing the in-memory config to TOML failed.
    #[error("failed to encode config: {source}")]
    ConfigEncode {
        #[source]
        source: toml::ser::Error,
    },

    /// No platform config directory could be determined (no home directory).
    #[error("could not determine a configuration directory for this platform")]
    ConfigDirUnavailable,
}
