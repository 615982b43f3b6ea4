use std::sync::mpsc;
use std::thread;

use engine_logging::engine_error;
use grabber_core::{EventKind, OutcomeEvent};

/// Print grabbing progress until the supervisor's sink goes away.
pub(crate) fn spawn_printer(
    events: mpsc::Receiver<OutcomeEvent>,
) -> Option<thread::JoinHandle<()>> {
    let spawned = thread::Builder::new()
        .name("event-printer".to_string())
        .spawn(move || {
            while let Ok(event) = events.recv() {
                println!("{}", render(&event));
            }
        });
    match spawned {
        Ok(handle) => Some(handle),
        Err(err) => {
            engine_error!("Failed to start event printer: {}", err);
            None
        }
    }
}

fn render(event: &OutcomeEvent) -> String {
    let label = match &event.kind {
        EventKind::Info(_) => "info",
        EventKind::Warning(_) => "warn",
        EventKind::ClaimSuccess(_) => "CLAIMED",
        EventKind::ClaimFailure { .. } => "failed",
    };
    format!("{} [{label}] {}", event.formatted_time(), event.message())
}
