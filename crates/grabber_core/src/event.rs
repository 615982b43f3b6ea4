use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::Candidate;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EventKind {
    Info(String),
    Warning(String),
    ClaimSuccess(Candidate),
    ClaimFailure { order_id: String, reason: String },
}

/// A progress report delivered to the observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
}

impl OutcomeEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EventKind::Info(message.into()))
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(EventKind::Warning(message.into()))
    }

    pub fn claim_success(candidate: Candidate) -> Self {
        Self::new(EventKind::ClaimSuccess(candidate))
    }

    pub fn claim_failure(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(EventKind::ClaimFailure {
            order_id: order_id.into(),
            reason: reason.into(),
        })
    }

    /// Claim outcomes are the only events kept in the run history.
    pub fn is_claim_outcome(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ClaimSuccess(_) | EventKind::ClaimFailure { .. }
        )
    }

    pub fn formatted_time(&self) -> String {
        self.timestamp.format(TIME_FORMAT).to_string()
    }

    pub fn message(&self) -> String {
        match &self.kind {
            EventKind::Info(message) | EventKind::Warning(message) => message.clone(),
            EventKind::ClaimSuccess(candidate) => format!(
                "claimed order {} (channel: {}, amount: {})",
                candidate.order_id, candidate.channel_type_name, candidate.amount
            ),
            EventKind::ClaimFailure { order_id, reason } => {
                format!("claim failed for order {order_id}: {reason}")
            }
        }
    }
}
