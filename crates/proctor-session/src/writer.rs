//! Terminal result writer

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use record_store::{ApplicationStore, StoreError};

use crate::TerminationReason;

/// Immutable terminal outcome of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    pub score: u32,
    pub reason: TerminationReason,
}

/// Persists the terminal outcome against the application record.
///
/// The store write moves status and score together and tolerates a
/// retry of an already-completed session, so a duplicate terminal
/// trigger that slipped past the reentrancy guard stays harmless.
pub struct ResultWriter {
    store: Arc<dyn ApplicationStore>,
}

impl ResultWriter {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store }
    }

    pub fn write(
        &self,
        job_id: &str,
        candidate: &str,
        outcome: &AssessmentOutcome,
    ) -> Result<(), StoreError> {
        self.store
            .complete_assessment(job_id, candidate, outcome.score)?;
        info!(
            job_id,
            candidate,
            score = outcome.score,
            reason = %outcome.reason,
            "terminal result recorded"
        );
        Ok(())
    }
}
