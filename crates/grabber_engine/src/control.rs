use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use grabber_core::{Envelope, GrabParams, OutcomeEvent, RunStatus, StartError};

use crate::WorkerSupervisor;

/// The operations the host application drives the grabber through.
///
/// Every call answers with an [`Envelope`] so the host can hand the result
/// straight to its UI layer.
pub struct GrabberApi {
    supervisor: Arc<WorkerSupervisor>,
}

impl GrabberApi {
    pub fn new(supervisor: Arc<WorkerSupervisor>) -> Self {
        Self { supervisor }
    }

    pub fn supervisor(&self) -> &Arc<WorkerSupervisor> {
        &self.supervisor
    }

    pub fn start(&self, params: GrabParams) -> Envelope<()> {
        match self.supervisor.start(params) {
            Ok(()) => Envelope::ok("grabbing started"),
            Err(StartError::AlreadyRunning) => Envelope::failure("grabbing is already running"),
            Err(err @ StartError::InvalidParams(_)) => Envelope::failure(err.to_string()),
        }
    }

    /// Start from the UI's order form.
    pub fn start_json(&self, form: &serde_json::Value) -> Envelope<()> {
        match GrabParams::from_json(form) {
            Ok(params) => self.start(params),
            Err(err) => {
                engine_warn!("Order form rejected: {}", err);
                Envelope::failure(StartError::from(err).to_string())
            }
        }
    }

    pub fn stop(&self) -> Envelope<()> {
        self.supervisor.stop();
        Envelope::ok("grabbing stopped")
    }

    pub fn status(&self) -> Envelope<RunStatus> {
        Envelope::with_data("ok", self.supervisor.status())
    }

    pub fn history(&self) -> Envelope<Vec<OutcomeEvent>> {
        Envelope::with_data("ok", self.supervisor.history())
    }

    /// Stop grabbing and forget the session.
    pub fn logout(&self) -> Envelope<()> {
        self.supervisor.stop();
        self.supervisor.credentials().clear();
        engine_info!("Session cleared");
        Envelope::ok("logged out")
    }

    pub fn user_info(&self) -> Envelope<serde_json::Value> {
        let credentials = self.supervisor.credentials().current();
        let Some(site) = credentials.target_site.as_ref() else {
            return Envelope::failure("no site is associated with the current session");
        };
        match self.supervisor.fetch_user_info(site.as_str()) {
            Ok(info) => Envelope::with_data("ok", info),
            Err(err) => {
                engine_warn!("Fetching account info failed: {}", err);
                Envelope::failure(format!("failed to fetch account info: {err}"))
            }
        }
    }
}
