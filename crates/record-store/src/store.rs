//! Store trait and in-memory implementation

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{ApplicationRecord, CandidateStatus, StoreError};

/// Change notification emitted after a successful write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEvent {
    pub job_id: String,
    pub candidate: String,
    pub status: CandidateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

/// Narrow store surface the assessment engine is allowed to touch.
pub trait ApplicationStore: Send + Sync {
    /// Current status of a candidate's application, if one exists.
    fn status_of(&self, job_id: &str, candidate: &str) -> Result<Option<CandidateStatus>, StoreError>;

    /// Terminal write: move the application to `AssessmentCompleted` and
    /// record the score. Both fields move together; a reader never sees
    /// one without the other. Retrying after success is a no-op.
    fn complete_assessment(
        &self,
        job_id: &str,
        candidate: &str,
        score: u32,
    ) -> Result<(), StoreError>;
}

/// In-memory record store keyed by (job, candidate)
pub struct InMemoryRecordStore {
    records: Mutex<HashMap<(String, String), ApplicationRecord>>,
    events: broadcast::Sender<RecordEvent>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            records: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.events.subscribe()
    }

    /// Insert or replace an application record
    pub fn upsert(&self, record: ApplicationRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let key = (record.job_id.clone(), record.candidate.clone());
        debug!(job_id = %record.job_id, candidate = %record.candidate, status = ?record.status, "record upserted");
        records.insert(key, record);
        Ok(())
    }

    /// Read a full record (test and admin surface)
    pub fn get(&self, job_id: &str, candidate: &str) -> Result<Option<ApplicationRecord>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(records.get(&(job_id.to_string(), candidate.to_string())).cloned())
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationStore for InMemoryRecordStore {
    fn status_of(&self, job_id: &str, candidate: &str) -> Result<Option<CandidateStatus>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(records
            .get(&(job_id.to_string(), candidate.to_string()))
            .map(|r| r.status))
    }

    fn complete_assessment(
        &self,
        job_id: &str,
        candidate: &str,
        score: u32,
    ) -> Result<(), StoreError> {
        let event = {
            let mut records = self
                .records
                .lock()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;

            let record = records
                .get_mut(&(job_id.to_string(), candidate.to_string()))
                .ok_or_else(|| StoreError::NotFound {
                    job_id: job_id.to_string(),
                    candidate: candidate.to_string(),
                })?;

            match record.status {
                CandidateStatus::SelectedForAssessment => {
                    // Status and score move in the same critical section.
                    record.status = CandidateStatus::AssessmentCompleted;
                    record.score = Some(score);
                    record.updated_at = chrono::Utc::now();
                    info!(job_id, candidate, score, "assessment completed");
                    RecordEvent {
                        job_id: record.job_id.clone(),
                        candidate: record.candidate.clone(),
                        status: record.status,
                        score: record.score,
                    }
                }
                CandidateStatus::AssessmentCompleted => {
                    // Duplicate terminal trigger that slipped past the
                    // session's reentrancy guard.
                    warn!(job_id, candidate, "duplicate completion ignored");
                    return Ok(());
                }
                other => return Err(StoreError::InvalidTransition(other)),
            }
        };

        // Nobody listening is fine.
        let _ = self.events.send(event);
        Ok(())
    }
}
