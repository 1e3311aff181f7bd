use crate::store::InquisitionStore;
use crate::types::{Inquisition, InquisitionStatus};
use std::sync::Arc;
use thiserror::Error;

/// Why the gate refused an outbound action.
#[derive(Debug, Error)]
pub enum GateFailure {
    #[error("Inquisition not found")]
    NotFound,
    #[error(
        "Inquisition not approved. Status: {status}. \
         Claw Court must vote to approve before emails can be sent."
    )]
    NotApproved {
        status: InquisitionStatus,
        karma_needed: u64,
    },
}

/// Guards every outbound side effect behind an approved Inquisition.
///
/// The gate reads a snapshot of the Inquisition at check time; status is
/// monotonic once approved, so a passed check never becomes invalid.
pub struct ActionGate {
    store: Arc<InquisitionStore>,
}

impl ActionGate {
    pub fn new(store: Arc<InquisitionStore>) -> Self {
        Self { store }
    }

    /// Pass only if the Inquisition exists and is `approved`.
    pub async fn require_approved(&self, inquisition_id: &str) -> Result<Inquisition, GateFailure> {
        let inquisition = self
            .store
            .get(inquisition_id)
            .await
            .ok_or(GateFailure::NotFound)?;
        if inquisition.status != InquisitionStatus::Approved {
            return Err(GateFailure::NotApproved {
                status: inquisition.status,
                karma_needed: inquisition.karma_needed(),
            });
        }
        Ok(inquisition)
    }
}
