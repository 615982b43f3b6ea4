use std::sync::mpsc;

use engine_logging::engine_debug;
use grabber_core::OutcomeEvent;

/// Observer of grabbing progress.
///
/// `emit` runs on a single dispatcher thread, in report order. A slow sink
/// delays later events but never a worker. A panicking `emit` loses only the
/// event it was handed.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: OutcomeEvent);
}

/// Forwards events into an unbounded channel; sending never blocks.
pub struct ChannelProgressSink {
    tx: mpsc::Sender<OutcomeEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<OutcomeEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::Receiver<OutcomeEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: OutcomeEvent) {
        if let Err(mpsc::SendError(event)) = self.tx.send(event) {
            engine_debug!("progress receiver gone, dropped: {}", event.message());
        }
    }
}

/// Discards every event.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: OutcomeEvent) {}
}
