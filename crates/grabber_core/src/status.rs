use serde::{Deserialize, Serialize};

/// Where a poll worker is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPhase {
    #[default]
    Idle,
    Polling,
    Filtering,
    Claiming,
    Sleeping,
    Stopped,
}

impl WorkerPhase {
    pub fn is_alive(self) -> bool {
        self != WorkerPhase::Stopped
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunStatus {
    pub is_running: bool,
    pub active_worker_count: usize,
    pub total_worker_count: usize,
    pub history_length: usize,
    pub poll_count: u64,
    /// Workers left behind by the most recent stop because they missed the
    /// join deadline.
    pub abandoned_worker_count: usize,
}
