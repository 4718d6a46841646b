//! Bounded polling of remote jobs.
//!
//! A wait alternates between two states: sleeping until the next status
//! check is due, and checking the remote status. The wait ends when a check reports
//! a terminal state, the timeout budget is spent, or the cancellation token
//! fires. The poller does not judge terminal states; the caller inspects the
//! returned status.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use transx_models::RemoteJobState;

use crate::config::PollPolicy;
use crate::error::{ServiceError, ServiceResult, WorkerError};

#[derive(Debug, Error)]
pub enum PollError {
    #[error("no terminal status after {elapsed:?}")]
    TimedOut { elapsed: Duration },

    #[error("wait cancelled")]
    Cancelled,

    #[error("status check failed {attempts} times in a row: {source}")]
    StatusCheck {
        attempts: u32,
        #[source]
        source: ServiceError,
    },
}

impl PollError {
    /// Attach the job name and lift into the worker taxonomy.
    pub fn into_worker_error(self, job: &str) -> WorkerError {
        match self {
            PollError::TimedOut { elapsed } => WorkerError::JobTimedOut {
                job: job.to_string(),
                elapsed,
            },
            PollError::Cancelled => WorkerError::Cancelled(format!("waiting for job {}", job)),
            PollError::StatusCheck { source, .. } => WorkerError::Service(source),
        }
    }
}

enum PollState {
    /// Sleep for the given delay (clamped to the deadline), then check.
    Waiting(Duration),
    Checking,
}

/// Waits for remote jobs according to one [`PollPolicy`].
#[derive(Debug, Clone)]
pub struct JobPoller {
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl JobPoller {
    pub fn new(policy: PollPolicy, cancel: CancellationToken) -> Self {
        Self { policy, cancel }
    }

    /// Check `job` until it reports a terminal state and return that state.
    ///
    /// Each status call races the deadline and the cancellation token, so a
    /// call that never answers still ends the wait on time.
    pub async fn wait_for<S, F, Fut>(&self, job: &str, mut fetch_status: F) -> Result<S, PollError>
    where
        S: RemoteJobState,
        F: FnMut() -> Fut,
        Fut: Future<Output = ServiceResult<S>>,
    {
        let started = Instant::now();
        let deadline = started + self.policy.timeout;
        let mut consecutive_failures = 0u32;
        let mut state = PollState::Waiting(self.policy.initial_delay);

        loop {
            state = match state {
                PollState::Waiting(delay) => {
                    let wake = (Instant::now() + delay).min(deadline);
                    self.sleep_until(wake).await?;
                    PollState::Checking
                }
                PollState::Checking => {
                    // A status that is ready at the deadline still counts.
                    let result = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(PollError::Cancelled),
                        result = fetch_status() => result,
                        _ = tokio::time::sleep_until(deadline) => {
                            return Err(PollError::TimedOut {
                                elapsed: started.elapsed(),
                            });
                        }
                    };

                    match result {
                        Ok(status) => {
                            consecutive_failures = 0;
                            debug!(job, status = status.as_str(), "Polled job status");
                            if status.is_terminal() {
                                return Ok(status);
                            }
                        }
                        Err(e) => {
                            consecutive_failures += 1;
                            if consecutive_failures > self.policy.max_check_failures {
                                return Err(PollError::StatusCheck {
                                    attempts: consecutive_failures,
                                    source: e,
                                });
                            }
                            warn!(
                                job,
                                attempt = consecutive_failures,
                                "Status check failed: {}",
                                e
                            );
                        }
                    }

                    if Instant::now() >= deadline {
                        return Err(PollError::TimedOut {
                            elapsed: started.elapsed(),
                        });
                    }
                    PollState::Waiting(self.policy.interval)
                }
            };
        }
    }

    async fn sleep_until(&self, wake: Instant) -> Result<(), PollError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PollError::Cancelled),
            _ = tokio::time::sleep_until(wake) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use transx_models::TranscriptionJobState;

    fn poller(timeout: u64, initial_delay: u64, interval: u64) -> JobPoller {
        JobPoller::new(
            PollPolicy::new(
                Duration::from_secs(timeout),
                Duration::from_secs(initial_delay),
                Duration::from_secs(interval),
            ),
            CancellationToken::new(),
        )
    }

    /// Status source that turns `Completed` on call number `terminal_on`.
    fn counting_status(
        calls: Arc<AtomicU32>,
        terminal_on: u32,
    ) -> impl FnMut() -> std::future::Ready<ServiceResult<TranscriptionJobState>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            let state = if n >= terminal_on {
                TranscriptionJobState::Completed
            } else {
                TranscriptionJobState::InProgress
            };
            std::future::ready(Ok(state))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_after_k_checks() {
        let calls = Arc::new(AtomicU32::new(0));
        let poller = poller(300, 0, 15);
        let start = Instant::now();

        let status = poller
            .wait_for("job", counting_status(calls.clone(), 3))
            .await
            .unwrap();

        assert_eq!(status, TranscriptionJobState::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() <= Duration::from_secs(3 * 15));
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_precedes_first_check() {
        let calls = Arc::new(AtomicU32::new(0));
        let poller = poller(2700, 60, 30);
        let start = Instant::now();

        poller
            .wait_for("job", counting_status(calls.clone(), 1))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_exactly_at_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let poller = poller(100, 0, 30);
        let start = Instant::now();

        let err = poller
            .wait_for("job", counting_status(calls.clone(), u32::MAX))
            .await
            .unwrap_err();

        match err {
            PollError::TimedOut { elapsed } => assert_eq!(elapsed, Duration::from_secs(100)),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(start.elapsed(), Duration::from_secs(100));
        // 0, 30, 60, 90 and a final check at the deadline
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_state_is_terminal_for_the_poller() {
        let poller = poller(60, 0, 10);
        let status = poller
            .wait_for("job", || std::future::ready(Ok(TranscriptionJobState::Failed)))
            .await
            .unwrap();
        assert_eq!(status, TranscriptionJobState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failures_are_bounded() {
        let calls = Arc::new(AtomicU32::new(0));
        let poller = poller(600, 0, 10);
        let counter = calls.clone();

        let err = poller
            .wait_for("job", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err::<TranscriptionJobState, _>(ServiceError::transcription(
                    "throttled",
                )))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::StatusCheck { attempts: 4, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_status_failure_recovers() {
        let calls = Arc::new(AtomicU32::new(0));
        let poller = poller(600, 0, 10);
        let counter = calls.clone();

        let status = poller
            .wait_for("job", move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(if n == 0 {
                    Err(ServiceError::transcription("throttled"))
                } else {
                    Ok(TranscriptionJobState::Completed)
                })
            })
            .await
            .unwrap();

        assert_eq!(status, TranscriptionJobState::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_wait() {
        let cancel = CancellationToken::new();
        let poller = JobPoller::new(PollPolicy::translation(), cancel.clone());
        let start = Instant::now();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let err = poller
            .wait_for("job", || std::future::ready(Ok(TranscriptionJobState::InProgress)))
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    fn never_answers() -> std::future::Pending<ServiceResult<TranscriptionJobState>> {
        std::future::pending()
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_status_call_times_out_at_budget() {
        let poller = poller(60, 0, 10);
        let start = Instant::now();

        let err = poller.wait_for("job", never_answers).await.unwrap_err();

        match err {
            PollError::TimedOut { elapsed } => assert_eq!(elapsed, Duration::from_secs(60)),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_status_call_is_cancellable() {
        let cancel = CancellationToken::new();
        let poller = JobPoller::new(
            PollPolicy::new(
                Duration::from_secs(60),
                Duration::ZERO,
                Duration::from_secs(10),
            ),
            cancel.clone(),
        );
        let start = Instant::now();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = poller.wait_for("job", never_answers).await.unwrap_err();

        assert!(matches!(err, PollError::Cancelled));
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_poll_error_mapping() {
        let err = PollError::TimedOut {
            elapsed: Duration::from_secs(300),
        }
        .into_worker_error("Transcribe_a_1");
        assert!(matches!(err, WorkerError::JobTimedOut { ref job, .. } if job == "Transcribe_a_1"));
        assert!(!err.is_fatal());
        assert!(PollError::Cancelled.into_worker_error("j").is_fatal());
    }
}
