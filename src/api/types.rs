//! Wire types for the Document Parse API.
//!
//! Field names mirror the vendor's JSON exactly (`request_id`,
//! `pages_processed`, `base64_encoding`, …); the structs here are plain
//! serde mirrors with no client-side behavior beyond a few small helpers.
//! Responses are produced entirely by the server and never mutated locally.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocParseError;

/// Default API base URL. Override with `--endpoint` for private hosting.
pub const DEFAULT_BASE_URL: &str = "https://api.upstage.ai/v1";

/// Default model alias; the server resolves it to the latest stable version.
pub const DEFAULT_MODEL: &str = "document-parse";

/// File extensions the API accepts, lowercase, without the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    // Documents
    "pdf", "docx", "pptx", "xlsx", "hwp",
    // Images
    "jpg", "jpeg", "png", "bmp", "tiff", "heic",
];

/// Whether the path carries an extension the API accepts (case-insensitive).
pub fn is_supported_file(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// The extension of `path` with its leading dot, as the user wrote it
/// (`"report.XYZ"` → `".XYZ"`, extension-less paths → `""`). Used verbatim in
/// the unsupported-format error.
pub fn raw_extension(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!(".{ext}"),
        None => String::new(),
    }
}

// ── Request side ──────────────────────────────────────────────────────────

/// Parsing mode requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Standard,
    Enhanced,
    Auto,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::Standard => "standard",
            ParseMode::Enhanced => "enhanced",
            ParseMode::Auto => "auto",
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParseMode {
    type Err = DocParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(ParseMode::Standard),
            "enhanced" => Ok(ParseMode::Enhanced),
            "auto" => Ok(ParseMode::Auto),
            _ => Err(DocParseError::InvalidConfigValue {
                key: "mode",
                allowed: "standard, enhanced, or auto",
            }),
        }
    }
}

/// OCR strategy: let the server decide, or force OCR on every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrStrategy {
    #[default]
    Auto,
    Force,
}

impl OcrStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            OcrStrategy::Auto => "auto",
            OcrStrategy::Force => "force",
        }
    }
}

impl fmt::Display for OcrStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OcrStrategy {
    type Err = DocParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(OcrStrategy::Auto),
            "force" => Ok(OcrStrategy::Force),
            _ => Err(DocParseError::InvalidConfigValue {
                key: "ocr",
                allowed: "auto or force",
            }),
        }
    }
}

/// Scalar options attached to every parse submission.
///
/// These become the non-file multipart fields; see
/// [`ParseOptions::form_fields`] for the exact wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    pub model: String,
    pub mode: ParseMode,
    pub ocr: OcrStrategy,
    pub chart_recognition: bool,
    pub merge_multipage_tables: bool,
    pub coordinates: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            mode: ParseMode::Standard,
            ocr: OcrStrategy::Auto,
            chart_recognition: true,
            merge_multipage_tables: false,
            coordinates: true,
        }
    }
}

impl ParseOptions {
    /// The scalar multipart fields in wire order, booleans stringified as
    /// `"true"`/`"false"`.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model", self.model.clone()),
            ("mode", self.mode.as_str().to_string()),
            ("ocr", self.ocr.as_str().to_string()),
            ("chart_recognition", self.chart_recognition.to_string()),
            (
                "merge_multipage_tables",
                self.merge_multipage_tables.to_string(),
            ),
            ("coordinates", self.coordinates.to_string()),
        ]
    }
}

/// One document submission: the file to upload plus its options.
///
/// Immutable once built; batch mode creates one request per file from a
/// shared [`ParseOptions`].
#[derive(Debug, Clone)]
pub struct ParseRequest {
    pub file: PathBuf,
    pub options: ParseOptions,
}

impl ParseRequest {
    /// A request for `file` with default options.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            options: ParseOptions::default(),
        }
    }

    /// A request for `file` with explicit options.
    pub fn with_options(file: impl Into<PathBuf>, options: ParseOptions) -> Self {
        Self {
            file: file.into(),
            options,
        }
    }
}

// ── Response side ─────────────────────────────────────────────────────────

/// Whole-document (or per-element) content in each rendering the server
/// produced. Absent renderings come back as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
}

/// One point of an element's bounding quadrilateral, in document-relative
/// units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

/// One structurally-recognized fragment of the document.
///
/// `id` is stable within a single response only. `category` is an open
/// string on the wire (`heading1`..`heading6`, `paragraph`, `table`,
/// `figure`, `chart`, `equation`, `list_item`, `header`, `footer`,
/// `caption`, …).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Vec<Coordinate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_encoding: Option<String>,
}

/// Page-count accounting attached to a parse response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub pages: u32,
}

/// A completed parse: whole-document content plus the ordered element list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResponse {
    #[serde(default)]
    pub api: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub usage: Usage,
}

/// Immediate acknowledgement of an async submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncResponse {
    pub request_id: String,
}

/// Lifecycle state of an async job as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Any status string this client does not know; treated as non-terminal
    /// so the poll loop keeps watching rather than erroring on new server
    /// states.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }

    /// `completed` and `failed` end the job; everything else keeps polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One snapshot of an async job's progress. Every poll is a fresh snapshot;
/// nothing is cached client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub request_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub pages_processed: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error envelope the API returns on non-success statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub code: String,
}
