//! HTTP client for the Document Parse API.
//!
//! Four operations, each a single round trip with bearer-token auth:
//! synchronous parse, async submit, status poll, result fetch. Non-success
//! responses are decoded into [`DocParseError::Api`] when the body carries
//! the vendor's `{"error": {...}}` envelope, and fall back to
//! [`DocParseError::Http`] with the raw body text otherwise. No call is ever
//! retried here; callers decide what a failure means.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::types::{
    AsyncResponse, ErrorResponse, ParseRequest, ParseResponse, StatusResponse, DEFAULT_BASE_URL,
};
use crate::error::DocParseError;

/// Default total per-call timeout. Large uploads on `enhanced` mode can take
/// minutes; the server holds the sync connection open for the whole parse.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for one API endpoint + key pair.
///
/// Cheap to clone is not a goal; build one per invocation and pass it by
/// reference. Dropping an in-flight call's future cancels the request.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ApiClient {
    /// Client against the default endpoint with the default timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self, DocParseError> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Synchronous parse: upload the document and block until the server
    /// returns the full [`ParseResponse`]. Succeeds only on HTTP 200.
    pub async fn parse(&self, request: &ParseRequest) -> Result<ParseResponse, DocParseError> {
        let form = build_form(request).await?;
        let url = format!("{}/document-digitization", self.base_url);
        debug!("POST {} ({})", url, request.file.display());

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        read_json(resp, &[StatusCode::OK]).await
    }

    /// Asynchronous submit: upload the document and return the request id
    /// immediately. Accepts HTTP 200 or 202.
    pub async fn parse_async(
        &self,
        request: &ParseRequest,
    ) -> Result<AsyncResponse, DocParseError> {
        let form = build_form(request).await?;
        let url = format!("{}/document-digitization/async", self.base_url);
        debug!("POST {} ({})", url, request.file.display());

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        read_json(resp, &[StatusCode::OK, StatusCode::ACCEPTED]).await
    }

    /// One fresh snapshot of an async job's status.
    pub async fn get_status(&self, request_id: &str) -> Result<StatusResponse, DocParseError> {
        let url = format!("{}/document-digitization/async/{}", self.base_url, request_id);
        debug!("GET {}", url);

        let resp = self.http.get(&url).bearer_auth(&self.api_key).send().await?;
        read_json(resp, &[StatusCode::OK]).await
    }

    /// Fetch the result of a completed async job. Callers must observe
    /// `completed` via [`ApiClient::get_status`] first; see
    /// [`crate::api::poll`].
    pub async fn get_result(&self, request_id: &str) -> Result<ParseResponse, DocParseError> {
        let url = format!(
            "{}/document-digitization/async/{}/result",
            self.base_url, request_id
        );
        debug!("GET {}", url);

        let resp = self.http.get(&url).bearer_auth(&self.api_key).send().await?;
        read_json(resp, &[StatusCode::OK]).await
    }
}

/// Builder mirroring the option set the client exposes: endpoint override
/// for private hosting, timeout override for very large documents.
#[derive(Debug)]
pub struct ApiClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl ApiClientBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ApiClient, DocParseError> {
        let http = reqwest::Client::builder().timeout(self.timeout).build()?;
        Ok(ApiClient {
            http,
            api_key: self.api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Assemble the multipart body: the file under the `document` field plus the
/// scalar option fields. Reads the file into memory.
async fn build_form(request: &ParseRequest) -> Result<Form, DocParseError> {
    let bytes = tokio::fs::read(&request.file)
        .await
        .map_err(|source| DocParseError::FileUnreadable {
            path: request.file.clone(),
            source,
        })?;

    let filename = request
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let mut form = Form::new().part("document", Part::bytes(bytes).file_name(filename));
    for (name, value) in request.options.form_fields() {
        form = form.text(name, value);
    }
    Ok(form)
}

/// Read the body once, then branch on status: accepted statuses decode into
/// `T`, everything else becomes an API/HTTP error.
async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    accept: &[StatusCode],
) -> Result<T, DocParseError> {
    let status = resp.status();
    let body = resp.bytes().await?;

    if !accept.contains(&status) {
        return Err(decode_api_error(status, &body));
    }

    serde_json::from_slice(&body).map_err(|source| DocParseError::Decode { source })
}

/// Map a non-success response body to the error taxonomy. A decodable
/// envelope with a non-empty message becomes [`DocParseError::Api`];
/// anything else keeps the raw text so the user sees what the server said.
fn decode_api_error(status: StatusCode, body: &[u8]) -> DocParseError {
    if let Ok(envelope) = serde_json::from_slice::<ErrorResponse>(body) {
        if !envelope.error.message.is_empty() {
            return DocParseError::Api {
                status: status.as_u16(),
                message: envelope.error.message,
                error_type: envelope.error.error_type,
                code: envelope.error.code,
            };
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    let body = if text.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        text
    };
    DocParseError::Http {
        status: status.as_u16(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_error_body_becomes_api_error() {
        let body = br#"{"error":{"message":"Invalid API key","type":"authentication_error","code":"invalid_api_key"}}"#;
        let err = decode_api_error(StatusCode::UNAUTHORIZED, body);
        match err {
            DocParseError::Api {
                status,
                message,
                error_type,
                code,
            } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
                assert_eq!(error_type, "authentication_error");
                assert_eq!(code, "invalid_api_key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_body_falls_back_to_http_error() {
        let err = decode_api_error(StatusCode::BAD_GATEWAY, b"upstream unavailable");
        match err {
            DocParseError::Http { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream unavailable");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_falls_back_to_canonical_reason() {
        let err = decode_api_error(StatusCode::INTERNAL_SERVER_ERROR, b"");
        match err {
            DocParseError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "Internal Server Error");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn json_body_without_message_keeps_raw_text() {
        let err = decode_api_error(StatusCode::SERVICE_UNAVAILABLE, br#"{"retry_after": 30}"#);
        match err {
            DocParseError::Http { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, r#"{"retry_after": 30}"#);
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn parse_missing_file_fails_before_any_request() {
        use std::path::Path;

        // Nothing listens on the base URL; an HTTP attempt would come back
        // as Transport, not FileUnreadable.
        let client = ApiClient::builder("k")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();

        let err = client
            .parse(&ParseRequest::new("/nonexistent/missing.pdf"))
            .await
            .unwrap_err();

        match err {
            DocParseError::FileUnreadable { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/missing.pdf"));
            }
            other => panic!("expected FileUnreadable, got {other:?}"),
        }
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let client = ApiClient::builder("k")
            .base_url("https://example.com/v1/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://example.com/v1");
    }

    #[test]
    fn default_base_url_is_vendor_endpoint() {
        let client = ApiClient::new("k").unwrap();
        assert_eq!(client.base_url(), "https://api.upstage.ai/v1");
    }
}
