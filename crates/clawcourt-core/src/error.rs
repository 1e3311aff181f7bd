use crate::types::{InquisitionStatus, VoteChoice};
use thiserror::Error;

/// Claw Court governance errors.
///
/// Every variant maps to a deterministic outcome: there is no retry policy for
/// governance mutations, and none of these variants ever leave partial state
/// behind in the stores.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Missing X-Moltbook-Identity header")]
    MissingToken,

    #[error("Invalid identity token")]
    InvalidToken,

    #[error("Agent not registered. Call /auth/register first.")]
    NotRegistered,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Inquisition not found")]
    InquisitionNotFound,

    #[error("Inquisition is no longer accepting votes. Status: {status}")]
    InvalidState { status: InquisitionStatus },

    #[error("You have already voted on this Inquisition")]
    AlreadyVoted { prior: VoteChoice },

    #[error("Upstream service '{service}' failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },
}

impl GovernanceError {
    pub fn validation(field: &str, requirement: &str) -> Self {
        Self::Validation(format!("{field} {requirement}"))
    }

    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }
}
