//! Poll-until-terminal state machine for async jobs.
//!
//! Transition knowledge comes only from the status endpoint:
//! `pending → processing → {completed | failed}`. The loop polls, reports
//! each snapshot to an observer, and sleeps a fixed interval between polls —
//! never tighter. A deadline, when set, is evaluated only *after* a poll, so
//! the loop always observes at least one status before it can time out, and
//! the timeout error carries the last snapshot it saw.
//!
//! The loop sleeps on tokio's clock, which is the test seam: under
//! `#[tokio::test(start_paused = true)]` sleeps complete instantly while
//! virtual time advances, so scripted sequences run without real waiting.
//! [`StatusSource`] abstracts the transport so tests script the server side.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::api::client::ApiClient;
use crate::api::types::{JobStatus, ParseResponse, StatusResponse};
use crate::error::DocParseError;

/// Interval between status polls in the always-wait modes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default wall-clock budget for `result --wait`.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// How a wait behaves: how often to poll, and for how long.
///
/// `deadline: None` polls forever (the `status --watch` mode); interactive
/// interrupt is the only way out of a job that never terminates.
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    pub deadline: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: Some(DEFAULT_WAIT_TIMEOUT),
        }
    }
}

impl PollOptions {
    /// Watch-style options: poll at `interval` until terminal, no deadline.
    pub fn without_deadline(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }
}

/// The two endpoints the poll loop needs. Implemented by [`ApiClient`]; test
/// code substitutes a scripted source.
pub trait StatusSource {
    fn get_status(
        &self,
        request_id: &str,
    ) -> impl Future<Output = Result<StatusResponse, DocParseError>> + Send;

    fn get_result(
        &self,
        request_id: &str,
    ) -> impl Future<Output = Result<ParseResponse, DocParseError>> + Send;
}

impl StatusSource for ApiClient {
    async fn get_status(&self, request_id: &str) -> Result<StatusResponse, DocParseError> {
        ApiClient::get_status(self, request_id).await
    }

    async fn get_result(&self, request_id: &str) -> Result<ParseResponse, DocParseError> {
        ApiClient::get_result(self, request_id).await
    }
}

/// Poll until the job reaches `completed` or `failed`, returning the final
/// snapshot. `on_status` sees every snapshot in poll order (the terminal one
/// included), which is how the binary renders live progress.
pub async fn wait_until_terminal<S, F>(
    source: &S,
    request_id: &str,
    options: PollOptions,
    mut on_status: F,
) -> Result<StatusResponse, DocParseError>
where
    S: StatusSource,
    F: FnMut(&StatusResponse),
{
    let deadline = options.deadline.map(|d| Instant::now() + d);

    loop {
        let status = source.get_status(request_id).await?;
        debug!(
            "poll {}: status={} progress={}%",
            request_id, status.status, status.progress
        );
        on_status(&status);

        if status.status.is_terminal() {
            return Ok(status);
        }

        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(DocParseError::WaitTimeout {
                    status: status.status,
                    progress: status.progress,
                });
            }
        }

        tokio::time::sleep(options.interval).await;
    }
}

/// Poll to completion, then fetch the result. A `failed` terminal state
/// surfaces the server's error message; the result endpoint is only ever
/// called after `completed` was observed.
pub async fn wait_for_result<S, F>(
    source: &S,
    request_id: &str,
    options: PollOptions,
    on_status: F,
) -> Result<ParseResponse, DocParseError>
where
    S: StatusSource,
    F: FnMut(&StatusResponse),
{
    let last = wait_until_terminal(source, request_id, options, on_status).await?;
    match last.status {
        JobStatus::Completed => source.get_result(request_id).await,
        _ => Err(DocParseError::JobFailed {
            message: last.error.unwrap_or_default(),
        }),
    }
}

/// Single-shot fetch: check status once and retrieve the result only if the
/// job already completed. `pending`/`processing` is a caller error
/// ([`DocParseError::NotCompleted`]), not something this function waits out.
pub async fn fetch_completed_result<S: StatusSource>(
    source: &S,
    request_id: &str,
) -> Result<ParseResponse, DocParseError> {
    let status = source.get_status(request_id).await?;
    match status.status {
        JobStatus::Completed => source.get_result(request_id).await,
        JobStatus::Failed => Err(DocParseError::JobFailed {
            message: status.error.unwrap_or_default(),
        }),
        other => Err(DocParseError::NotCompleted { status: other }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves a scripted status sequence; once the script runs out, the last
    /// entry repeats forever (a job stuck in one state).
    struct ScriptedSource {
        script: Mutex<VecDeque<StatusResponse>>,
        polls: AtomicUsize,
        result_fetches: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<StatusResponse>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                polls: AtomicUsize::new(0),
                result_fetches: AtomicUsize::new(0),
            }
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }

        fn result_fetches(&self) -> usize {
            self.result_fetches.load(Ordering::SeqCst)
        }
    }

    impl StatusSource for ScriptedSource {
        async fn get_status(&self, _request_id: &str) -> Result<StatusResponse, DocParseError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let snapshot = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().expect("status script is empty")
            };
            Ok(snapshot)
        }

        async fn get_result(&self, _request_id: &str) -> Result<ParseResponse, DocParseError> {
            self.result_fetches.fetch_add(1, Ordering::SeqCst);
            let mut resp = ParseResponse::default();
            resp.content.markdown = "# done".to_string();
            Ok(resp)
        }
    }

    fn snapshot(status: JobStatus, progress: u32) -> StatusResponse {
        StatusResponse {
            request_id: "req_test".into(),
            status,
            progress,
            pages_processed: 0,
            total_pages: 10,
            error: None,
        }
    }

    fn options(interval_secs: u64, deadline_secs: Option<u64>) -> PollOptions {
        PollOptions {
            interval: Duration::from_secs(interval_secs),
            deadline: deadline_secs.map(Duration::from_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_sequence_polls_exactly_four_times() {
        let source = ScriptedSource::new(vec![
            snapshot(JobStatus::Pending, 0),
            snapshot(JobStatus::Processing, 20),
            snapshot(JobStatus::Processing, 60),
            snapshot(JobStatus::Completed, 100),
        ]);

        let start = Instant::now();
        let mut seen = Vec::new();
        let result = wait_for_result(&source, "req_test", options(5, Some(300)), |s| {
            seen.push(s.status)
        })
        .await
        .unwrap();

        assert_eq!(source.polls(), 4);
        assert_eq!(source.result_fetches(), 1);
        assert_eq!(result.content.markdown, "# done");
        assert_eq!(
            seen,
            [
                JobStatus::Pending,
                JobStatus::Processing,
                JobStatus::Processing,
                JobStatus::Completed
            ]
        );
        // Three sleeps between four polls, never tighter than the interval.
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_exceeded_reports_last_snapshot() {
        let source = ScriptedSource::new(vec![
            snapshot(JobStatus::Pending, 0),
            snapshot(JobStatus::Processing, 40),
        ]);

        let err = wait_for_result(&source, "req_test", options(5, Some(7)), |_| {})
            .await
            .unwrap_err();

        match err {
            DocParseError::WaitTimeout { status, progress } => {
                assert_eq!(status, JobStatus::Processing);
                assert_eq!(progress, 40);
            }
            other => panic!("expected WaitTimeout, got {other:?}"),
        }
        // Polls at t=0s, 5s, 10s; the deadline (7s) is checked after each poll.
        assert_eq!(source.polls(), 3);
        assert_eq!(source.result_fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_deadline_still_polls_once() {
        let source = ScriptedSource::new(vec![snapshot(JobStatus::Pending, 0)]);

        let err = wait_for_result(&source, "req_test", options(5, Some(0)), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DocParseError::WaitTimeout {
                status: JobStatus::Pending,
                progress: 0
            }
        ));
        assert_eq!(source.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_surfaces_server_message_without_result_fetch() {
        let mut failed = snapshot(JobStatus::Failed, 30);
        failed.error = Some("insufficient credits".into());
        let source = ScriptedSource::new(vec![snapshot(JobStatus::Processing, 10), failed]);

        let err = wait_for_result(&source, "req_test", options(5, Some(300)), |_| {})
            .await
            .unwrap_err();

        match err {
            DocParseError::JobFailed { message } => assert_eq!(message, "insufficient credits"),
            other => panic!("expected JobFailed, got {other:?}"),
        }
        assert_eq!(source.polls(), 2);
        assert_eq!(source.result_fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_on_first_poll_never_sleeps() {
        let source = ScriptedSource::new(vec![snapshot(JobStatus::Completed, 100)]);

        let start = Instant::now();
        wait_for_result(&source, "req_test", options(5, Some(300)), |_| {})
            .await
            .unwrap();

        assert_eq!(source.polls(), 1);
        assert_eq!(source.result_fetches(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn watch_mode_without_deadline_stops_at_terminal() {
        let source = ScriptedSource::new(vec![
            snapshot(JobStatus::Pending, 0),
            snapshot(JobStatus::Processing, 50),
            snapshot(JobStatus::Completed, 100),
        ]);

        let last = wait_until_terminal(
            &source,
            "req_test",
            PollOptions::without_deadline(Duration::from_secs(2)),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(last.status, JobStatus::Completed);
        assert_eq!(source.polls(), 3);
        // Watch mode never fetches the result itself.
        assert_eq!(source.result_fetches(), 0);
    }

    #[tokio::test]
    async fn fetch_refuses_non_completed_job() {
        let source = ScriptedSource::new(vec![snapshot(JobStatus::Processing, 50)]);

        let err = fetch_completed_result(&source, "req_test").await.unwrap_err();
        assert!(matches!(
            err,
            DocParseError::NotCompleted {
                status: JobStatus::Processing
            }
        ));
        assert_eq!(source.result_fetches(), 0);
    }

    #[tokio::test]
    async fn fetch_returns_result_for_completed_job() {
        let source = ScriptedSource::new(vec![snapshot(JobStatus::Completed, 100)]);

        let result = fetch_completed_result(&source, "req_test").await.unwrap();
        assert_eq!(result.content.markdown, "# done");
        assert_eq!(source.polls(), 1);
        assert_eq!(source.result_fetches(), 1);
    }

    #[tokio::test]
    async fn fetch_surfaces_failed_job_error() {
        let mut failed = snapshot(JobStatus::Failed, 0);
        failed.error = Some("unsupported encryption".into());
        let source = ScriptedSource::new(vec![failed]);

        let err = fetch_completed_result(&source, "req_test").await.unwrap_err();
        match err {
            DocParseError::JobFailed { message } => assert_eq!(message, "unsupported encryption"),
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }
}
