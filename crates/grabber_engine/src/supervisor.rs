use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use grabber_core::{
    GrabParams, OutcomeEvent, RunStatus, StartError, WorkerPhase, HISTORY_CAPACITY,
};
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::ledger::{Reporter, RunLedger};
use crate::worker::{PollWorker, WorkerTiming};
use crate::{
    ClaimClient, ClientSettings, CredentialStore, ProgressSink, ReqwestClaimClient,
    SupervisorError, TransportError,
};

#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// How long `stop` waits for each worker before abandoning it.
    pub join_timeout: Duration,
    /// Pause after a poll cycle that blew up.
    pub error_backoff: Duration,
    /// Upper bound on any single remote call made by a worker.
    pub request_timeout: Duration,
    /// Claim history size, at most [`HISTORY_CAPACITY`].
    pub history_capacity: usize,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(2),
            error_backoff: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            history_capacity: HISTORY_CAPACITY,
        }
    }
}

#[derive(Clone)]
struct WorkerHandle {
    index: usize,
    phase: watch::Receiver<WorkerPhase>,
}

impl WorkerHandle {
    fn is_alive(&self) -> bool {
        // A closed channel means the task is gone without reporting `Stopped`.
        self.phase.borrow().is_alive() && self.phase.has_changed().is_ok()
    }

    async fn stopped(&mut self) {
        // Err means the sender was dropped, which also counts as exited.
        let _ = self.phase.wait_for(|phase| !phase.is_alive()).await;
    }
}

struct Lifecycle {
    is_running: bool,
    cancel: CancellationToken,
    workers: Vec<WorkerHandle>,
    abandoned: usize,
}

impl Lifecycle {
    fn idle() -> Self {
        Self {
            is_running: false,
            cancel: CancellationToken::new(),
            workers: Vec::new(),
            abandoned: 0,
        }
    }
}

/// Owns the polling pool and its run state.
///
/// Workers are tasks on a runtime the supervisor owns, so it must be driven
/// from synchronous code: `stop` blocks the caller while workers wind down.
pub struct WorkerSupervisor {
    runtime: Runtime,
    client: Arc<dyn ClaimClient>,
    credentials: Arc<CredentialStore>,
    reporter: Arc<Reporter>,
    settings: SupervisorSettings,
    // Serializes start and stop end to end.
    control: Mutex<()>,
    // Held only briefly, so status queries never wait behind a stop.
    lifecycle: Mutex<Lifecycle>,
}

impl WorkerSupervisor {
    pub fn new(
        client: Arc<dyn ClaimClient>,
        credentials: Arc<CredentialStore>,
        sink: Arc<dyn ProgressSink>,
        settings: SupervisorSettings,
    ) -> Result<Self, SupervisorError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("grab-worker")
            .build()?;
        let ledger = Arc::new(RunLedger::with_capacity(settings.history_capacity));
        Ok(Self {
            runtime,
            client,
            credentials,
            reporter: Arc::new(Reporter::new(sink, ledger)),
            settings,
            control: Mutex::new(()),
            lifecycle: Mutex::new(Lifecycle::idle()),
        })
    }

    /// Supervisor talking to the real service over HTTP.
    pub fn with_http(
        client_settings: ClientSettings,
        credentials: Arc<CredentialStore>,
        sink: Arc<dyn ProgressSink>,
        settings: SupervisorSettings,
    ) -> Result<Self, SupervisorError> {
        let client = ReqwestClaimClient::new(client_settings)?;
        Self::new(Arc::new(client), credentials, sink, settings)
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn start(&self, params: GrabParams) -> Result<(), StartError> {
        let _control = lock(&self.control);
        params.validate().inspect_err(|err| {
            engine_warn!("Rejected grab parameters: {}", err);
        })?;

        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.is_running {
            engine_warn!("Grabbing is already running; start ignored");
            return Err(StartError::AlreadyRunning);
        }

        let params = Arc::new(params);
        let cancel = CancellationToken::new();
        let workers = (1..=params.worker_count)
            .map(|index| self.spawn_worker(index, &params, &cancel))
            .collect();

        lifecycle.cancel = cancel;
        lifecycle.workers = workers;
        lifecycle.abandoned = 0;
        lifecycle.is_running = true;

        engine_info!(
            "Started {} grab workers against {} (price {}..={}, methods {:?}, every {}s)",
            params.worker_count,
            params.site_base(),
            params.min_price,
            params.max_price,
            params.payment_methods,
            params.poll_interval_seconds
        );
        Ok(())
    }

    fn spawn_worker(
        &self,
        index: usize,
        params: &Arc<GrabParams>,
        cancel: &CancellationToken,
    ) -> WorkerHandle {
        let (phase_tx, phase_rx) = watch::channel(WorkerPhase::Idle);
        let worker = PollWorker {
            index,
            params: params.clone(),
            credentials: self.credentials.clone(),
            client: self.client.clone(),
            reporter: self.reporter.clone(),
            cancel: cancel.clone(),
            phase: phase_tx,
            timing: WorkerTiming {
                request_timeout: self.settings.request_timeout,
                error_backoff: self.settings.error_backoff,
            },
        };
        // Detached: stop waits on the phase channel, never on the task itself.
        drop(self.runtime.spawn(worker.run()));
        WorkerHandle {
            index,
            phase: phase_rx,
        }
    }

    pub fn stop(&self) {
        let _control = lock(&self.control);
        let workers = {
            let lifecycle = lock(&self.lifecycle);
            if !lifecycle.is_running {
                return;
            }
            engine_info!("Stopping {} grab workers", lifecycle.workers.len());
            lifecycle.cancel.cancel();
            lifecycle.workers.clone()
        };

        let join_timeout = self.settings.join_timeout;
        let abandoned = self.runtime.block_on(async move {
            let mut abandoned = 0;
            for mut worker in workers {
                if tokio::time::timeout(join_timeout, worker.stopped())
                    .await
                    .is_err()
                {
                    engine_warn!(
                        worker = worker.index;
                        "did not stop within {:?}, abandoning it",
                        join_timeout
                    );
                    abandoned += 1;
                }
            }
            abandoned
        });

        {
            let mut lifecycle = lock(&self.lifecycle);
            lifecycle.is_running = false;
            lifecycle.workers.clear();
            lifecycle.abandoned = abandoned;
        }
        self.reporter.ledger().reset_poll_count();
        self.reporter.report(OutcomeEvent::info("grabbing stopped"));
        engine_info!("Grabbing stopped ({} workers abandoned)", abandoned);
    }

    pub fn status(&self) -> RunStatus {
        let lifecycle = lock(&self.lifecycle);
        let ledger = self.reporter.ledger();
        RunStatus {
            is_running: lifecycle.is_running,
            active_worker_count: lifecycle
                .workers
                .iter()
                .filter(|worker| worker.is_alive())
                .count(),
            total_worker_count: lifecycle.workers.len(),
            history_length: ledger.history_len(),
            poll_count: ledger.poll_count(),
            abandoned_worker_count: lifecycle.abandoned,
        }
    }

    pub fn history(&self) -> Vec<OutcomeEvent> {
        self.reporter.ledger().history()
    }

    /// Account details for the logged-in session.
    pub fn fetch_user_info(&self, site: &str) -> Result<serde_json::Value, TransportError> {
        let credentials = self.credentials.current();
        self.runtime
            .block_on(self.client.user_info(site, &credentials))
    }
}

impl Drop for WorkerSupervisor {
    fn drop(&mut self) {
        lock(&self.lifecycle).cancel.cancel();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
