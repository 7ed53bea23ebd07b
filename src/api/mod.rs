//! HTTP client for the Upstage Document Parse API.
//!
//! Split into three layers, each independently testable:
//!
//! ```text
//! types ──▶ client ──▶ poll
//! (wire)    (HTTP)     (async lifecycle)
//! ```
//!
//! 1. [`types`]  — request options and the JSON wire model, plus the
//!    supported-extension gate applied before any network call
//! 2. [`client`] — the reqwest transport: multipart upload, bearer auth,
//!    and the two-tier error decode for non-2xx responses
//! 3. [`poll`]   — the poll-until-terminal state machine behind `--wait`
//!    and `--watch`; network-free thanks to [`poll::StatusSource`]

pub mod client;
pub mod poll;
pub mod types;

pub use client::{ApiClient, ApiClientBuilder, DEFAULT_TIMEOUT};
pub use poll::{
    fetch_completed_result, wait_for_result, wait_until_terminal, PollOptions, StatusSource,
    DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};
pub use types::{
    is_supported_file, AsyncResponse, Content, Coordinate, Element, ErrorDetail, ErrorResponse,
    JobStatus, OcrStrategy, ParseMode, ParseOptions, ParseRequest, ParseResponse, StatusResponse,
    Usage, DEFAULT_BASE_URL, DEFAULT_MODEL, SUPPORTED_EXTENSIONS,
};
