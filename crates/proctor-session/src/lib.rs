//! Proctored Assessment Session
//!
//! Orchestrates one candidate's timed, camera-proctored attempt at a
//! multiple-choice assessment:
//! - Eligibility and question-set loading
//! - Camera/model acquisition as a hard setup gate
//! - In-progress navigation and answer capture
//! - Exactly-once termination from any of four triggers (user submit,
//!   timer expiry, sustained absence, page hidden)
//! - Deterministic scoring and a single atomic result write

pub mod config;
pub mod machine;
pub mod session;
pub mod timer;
pub mod writer;

pub use config::SessionConfig;
pub use machine::{SessionMachine, SessionPhase};
pub use session::{AssessmentSession, SessionCommand, SessionContext, SessionHandle, SessionView};
pub use timer::CountdownTimer;
pub use writer::{AssessmentOutcome, ResultWriter};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use question_bank::BankError;
use record_store::StoreError;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No assessment has been generated for job {0}")]
    AssessmentMissing(String),

    #[error("Candidate is not selected for this assessment")]
    Ineligible,

    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Proctoring setup failed: {0}")]
    Setup(String),

    #[error("Chosen value is not an option of the current question")]
    InvalidOption,

    #[error("Session is not in progress")]
    NotInProgress,

    #[error("All questions must be answered before submitting")]
    Incomplete,

    #[error("Session abandoned before termination")]
    Abandoned,

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a session terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationReason {
    /// Candidate confirmed submission
    UserSubmitted,
    /// Countdown reached zero
    TimeExpired,
    /// No face for the full grace window
    CandidateNotVisible,
    /// Assessment page was backgrounded
    LeftAssessmentTab,
}

impl TerminationReason {
    /// UI-facing description of the outcome
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::UserSubmitted => "submitted by user",
            TerminationReason::TimeExpired => "time expired",
            TerminationReason::CandidateNotVisible => "candidate not visible",
            TerminationReason::LeftAssessmentTab => "left the assessment tab",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
