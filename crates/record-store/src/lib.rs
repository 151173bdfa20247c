//! Application Record Store
//!
//! Narrow read/write surface over the candidate application records the
//! assessment engine touches:
//! - Eligibility reads (candidate status for a job posting)
//! - The single terminal status + score write of a finished session
//! - Change notification so other open views refresh
//!
//! Status values are a closed enumeration; the terminal write is atomic
//! from the caller's perspective and idempotent when retried.

mod store;

pub use store::{ApplicationStore, InMemoryRecordStore, RecordEvent};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Store error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No application for candidate {candidate} on job {job_id}")]
    NotFound { job_id: String, candidate: String },

    #[error("Cannot complete assessment from status {0:?}")]
    InvalidTransition(CandidateStatus),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Lifecycle of one candidate's application to one job posting.
///
/// Serialized with the product's historical status strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStatus {
    #[serde(rename = "Applied")]
    Applied,
    #[serde(rename = "Selected for Test")]
    SelectedForAssessment,
    #[serde(rename = "Test Completed")]
    AssessmentCompleted,
    #[serde(rename = "Not Selected")]
    NotSelected,
}

/// One candidate's application record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub job_id: String,
    pub candidate: String,
    pub status: CandidateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    /// Fresh record for a new application
    pub fn new(job_id: impl Into<String>, candidate: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id: job_id.into(),
            candidate: candidate.into(),
            status: CandidateStatus::Applied,
            score: None,
            updated_at: Utc::now(),
        }
    }

    /// Record already moved to the assessment-selected status
    pub fn selected(job_id: impl Into<String>, candidate: impl Into<String>) -> Self {
        Self {
            status: CandidateStatus::SelectedForAssessment,
            ..Self::new(job_id, candidate)
        }
    }
}
