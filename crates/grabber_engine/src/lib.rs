//! Grabber engine: remote calls, the polling pool and its supervisor.
mod client;
mod control;
mod credentials;
mod ledger;
mod sink;
mod supervisor;
mod types;
mod worker;

pub use client::{ClaimClient, ClientSettings, ReqwestClaimClient};
pub use control::GrabberApi;
pub use credentials::{CredentialStore, Credentials};
pub use sink::{ChannelProgressSink, NullProgressSink, ProgressSink};
pub use supervisor::{SupervisorSettings, WorkerSupervisor};
pub use types::{ClaimOutcome, ListResponse, SupervisorError, TransportError, TransportFailure};
