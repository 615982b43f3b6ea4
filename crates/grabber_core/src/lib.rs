//! Grabber core: pure domain types and claim decisions.
mod candidate;
mod envelope;
mod error;
mod event;
mod filter;
mod history;
mod params;
mod status;

pub use candidate::{Candidate, ChannelType};
pub use envelope::Envelope;
pub use error::{ParamsError, StartError};
pub use event::{EventKind, OutcomeEvent};
pub use filter::{eligible_method, should_claim, skip_message, PayInfo, MAX_ACCOUNT_LEN};
pub use history::{History, HISTORY_CAPACITY};
pub use params::{GrabParams, PaymentMethod, DEFAULT_WORKER_COUNT};
pub use status::{RunStatus, WorkerPhase};
