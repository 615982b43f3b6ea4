use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use engine_logging::engine_error;
use grabber_core::{History, OutcomeEvent, HISTORY_CAPACITY};

use crate::ProgressSink;

#[derive(Debug, Default)]
struct LedgerState {
    poll_count: u64,
    history: History,
}

/// Poll counter and claim history of the current run, behind one mutex.
#[derive(Debug, Default)]
pub(crate) struct RunLedger {
    state: Mutex<LedgerState>,
}

impl RunLedger {
    /// Capacities above [`HISTORY_CAPACITY`] are clamped to it.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                poll_count: 0,
                history: History::with_capacity(capacity.min(HISTORY_CAPACITY)),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the new count.
    pub(crate) fn increment_poll(&self) -> u64 {
        let mut state = self.lock();
        state.poll_count += 1;
        state.poll_count
    }

    pub(crate) fn reset_poll_count(&self) {
        self.lock().poll_count = 0;
    }

    pub(crate) fn poll_count(&self) -> u64 {
        self.lock().poll_count
    }

    pub(crate) fn record(&self, event: &OutcomeEvent) {
        if event.is_claim_outcome() {
            self.lock().history.push(event.clone());
        }
    }

    pub(crate) fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    pub(crate) fn history(&self) -> Vec<OutcomeEvent> {
        self.lock().history.snapshot()
    }
}

/// Records events in the ledger and hands them to the sink on a dedicated
/// thread, so a slow sink never holds up a poll cycle.
pub(crate) struct Reporter {
    ledger: Arc<RunLedger>,
    tx: mpsc::Sender<OutcomeEvent>,
}

impl Reporter {
    pub(crate) fn new(sink: Arc<dyn ProgressSink>, ledger: Arc<RunLedger>) -> Self {
        let (tx, rx) = mpsc::channel::<OutcomeEvent>();
        let spawned = thread::Builder::new()
            .name("grab-progress".to_string())
            .spawn(move || {
                while let Ok(event) = rx.recv() {
                    let delivered = panic::catch_unwind(AssertUnwindSafe(|| sink.emit(event)));
                    if let Err(payload) = delivered {
                        engine_error!(
                            "Progress sink panicked, event dropped: {}",
                            panic_text(payload.as_ref())
                        );
                    }
                }
            });
        if let Err(err) = spawned {
            engine_error!("Failed to start progress dispatcher, events will be dropped: {}", err);
        }
        Self { ledger, tx }
    }

    pub(crate) fn ledger(&self) -> &RunLedger {
        &self.ledger
    }

    pub(crate) fn report(&self, event: OutcomeEvent) {
        self.ledger.record(&event);
        if self.tx.send(event).is_err() {
            engine_error!("Progress dispatcher is gone; dropping event");
        }
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_capacity_is_capped() {
        let ledger = RunLedger::with_capacity(HISTORY_CAPACITY * 5);
        for n in 0..(HISTORY_CAPACITY * 2) {
            ledger.record(&OutcomeEvent::claim_failure(format!("SO-{n}"), "taken"));
        }
        assert_eq!(ledger.history_len(), HISTORY_CAPACITY);
    }

    #[test]
    fn only_claim_outcomes_enter_history() {
        let ledger = RunLedger::with_capacity(10);
        ledger.record(&OutcomeEvent::info("order list refreshed 1 times"));
        ledger.record(&OutcomeEvent::warning("no orders detected"));
        ledger.record(&OutcomeEvent::claim_failure("SO-1", "taken"));
        assert_eq!(ledger.history_len(), 1);
    }
}
