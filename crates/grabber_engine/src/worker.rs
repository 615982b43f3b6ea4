use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use futures_util::FutureExt;
use grabber_core::{should_claim, skip_message, Candidate, GrabParams, OutcomeEvent, WorkerPhase};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::ledger::Reporter;
use crate::{
    ClaimClient, ClaimOutcome, CredentialStore, Credentials, ListResponse, TransportError,
    TransportFailure,
};

/// Timing knobs a worker needs besides the per-run params.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WorkerTiming {
    pub(crate) request_timeout: Duration,
    pub(crate) error_backoff: Duration,
}

/// One member of the polling pool.
///
/// Runs poll, filter, claim, sleep until the cancellation token fires. No
/// error ends the loop.
pub(crate) struct PollWorker {
    pub(crate) index: usize,
    pub(crate) params: Arc<GrabParams>,
    pub(crate) credentials: Arc<CredentialStore>,
    pub(crate) client: Arc<dyn ClaimClient>,
    pub(crate) reporter: Arc<Reporter>,
    pub(crate) cancel: CancellationToken,
    pub(crate) phase: watch::Sender<WorkerPhase>,
    pub(crate) timing: WorkerTiming,
}

impl PollWorker {
    pub(crate) async fn run(self) {
        engine_info!(worker = self.index; "started");

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let cycle = AssertUnwindSafe(self.poll_cycle()).catch_unwind().await;
            if let Err(panic) = cycle {
                engine_error!(
                    worker = self.index;
                    "poll cycle aborted: {}; backing off for {:?}",
                    panic_message(panic.as_ref()),
                    self.timing.error_backoff
                );
                self.set_phase(WorkerPhase::Sleeping);
                if !self.pause(self.timing.error_backoff).await {
                    break;
                }
                continue;
            }

            if self.cancel.is_cancelled() {
                break;
            }
            self.set_phase(WorkerPhase::Sleeping);
            if !self.pause(self.params.poll_interval()).await {
                break;
            }
        }

        self.set_phase(WorkerPhase::Stopped);
        engine_info!(worker = self.index; "stopped");
    }

    async fn poll_cycle(&self) {
        self.set_phase(WorkerPhase::Polling);

        let credentials = self.credentials.current();
        if !credentials.has_token() {
            // The server is the authority on auth; let it reject the request.
            engine_warn!(worker = self.index; "no bearer token available, polling anyway");
        }

        let params = &self.params;
        let listing = self
            .timed(self.client.list_candidates(
                params.site_base(),
                params.min_price,
                params.max_price,
                &credentials,
            ))
            .await;
        let response = match listing {
            Ok(response) => response,
            Err(err) => {
                engine_error!(worker = self.index; "order list request failed: {}", err);
                return;
            }
        };

        if self.cancel.is_cancelled() {
            engine_debug!(worker = self.index; "order list arrived after stop, discarded");
            return;
        }

        let count = self.reporter.ledger().increment_poll();
        self.reporter.report(OutcomeEvent::info(format!(
            "order list refreshed {count} times"
        )));

        match response {
            ListResponse::Rejected { code, reason } => {
                engine_warn!(worker = self.index; "order list rejected with code {}: {}", code, reason);
                self.reporter.report(OutcomeEvent::warning(format!(
                    "order list rejected (code {code}): {reason}"
                )));
            }
            ListResponse::Candidates(candidates) if candidates.is_empty() => {
                self.reporter.report(OutcomeEvent::warning(format!(
                    "no orders detected -- {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S")
                )));
            }
            ListResponse::Candidates(candidates) => {
                engine_debug!(worker = self.index; "evaluating {} orders", candidates.len());
                self.evaluate(candidates, &credentials).await;
            }
        }
    }

    async fn evaluate(&self, candidates: Vec<Candidate>, credentials: &Credentials) {
        for candidate in candidates {
            if self.cancel.is_cancelled() {
                engine_debug!(worker = self.index; "cancelled mid-page, leaving remaining orders");
                return;
            }

            self.set_phase(WorkerPhase::Filtering);
            if !should_claim(&candidate, &self.params.payment_methods) {
                self.reporter
                    .report(OutcomeEvent::warning(skip_message(&candidate)));
                continue;
            }

            self.set_phase(WorkerPhase::Claiming);
            let attempt = self
                .timed(self.client.claim(
                    self.params.site_base(),
                    &candidate.order_id,
                    credentials,
                ))
                .await;
            let event = match attempt {
                Ok(ClaimOutcome::Success) => {
                    engine_info!(worker = self.index; "claimed order {}", candidate.order_id);
                    OutcomeEvent::claim_success(candidate)
                }
                Ok(ClaimOutcome::Failure(reason)) => {
                    engine_warn!(worker = self.index; "claim of {} refused: {}", candidate.order_id, reason);
                    OutcomeEvent::claim_failure(candidate.order_id, reason)
                }
                Err(err) => {
                    engine_error!(worker = self.index; "claim of {} failed: {}", candidate.order_id, err);
                    OutcomeEvent::claim_failure(candidate.order_id, err.to_string())
                }
            };
            self.reporter.report(event);
        }
    }

    /// Bound a remote call by the request timeout, whatever the client does.
    async fn timed<T>(
        &self,
        call: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, TransportError> {
        match tokio::time::timeout(self.timing.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::new(
                TransportFailure::Timeout,
                format!("no response within {:?}", self.timing.request_timeout),
            )),
        }
    }

    /// Sleep unless cancelled first. Returns false on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }

    fn set_phase(&self, phase: WorkerPhase) {
        self.phase.send_replace(phase);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
