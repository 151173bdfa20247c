//! Synchronous session state machine
//!
//! Holds the phase, answer sheet, and navigation cursor. All mutation
//! happens through the methods here; the async layer in `session`
//! serializes calls and owns the cross-task termination claim.

use serde::{Deserialize, Serialize};
use tracing::debug;

use question_bank::{AnswerSheet, Assessment};

use crate::{SessionError, TerminationReason};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    /// Fetching the question set and checking eligibility
    Loading,
    /// Waiting on camera permission and model load
    AwaitingCamera,
    /// Candidate answering questions
    InProgress,
    /// Termination claimed; scoring and persisting
    Submitting,
    /// Outcome durably recorded
    Terminated,
}

/// State for one live attempt
pub struct SessionMachine {
    assessment: Assessment,
    sheet: AnswerSheet,
    index: usize,
    phase: SessionPhase,
    reason: Option<TerminationReason>,
}

impl SessionMachine {
    pub fn new(assessment: Assessment) -> Self {
        let sheet = AnswerSheet::new(assessment.len());
        Self {
            assessment,
            sheet,
            index: 0,
            phase: SessionPhase::Loading,
            reason: None,
        }
    }

    /// Setup advanced to the camera gate
    pub fn begin_camera_wait(&mut self) {
        self.phase = SessionPhase::AwaitingCamera;
    }

    /// Proctoring is live; the attempt starts
    pub fn begin_in_progress(&mut self) {
        self.phase = SessionPhase::InProgress;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn sheet(&self) -> &AnswerSheet {
        &self.sheet
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        self.reason
    }

    /// Record the candidate's choice for the current question.
    ///
    /// Overwrites any prior entry for this index; values outside the
    /// question's option list are rejected.
    pub fn select_answer(&mut self, choice: &str) -> Result<(), SessionError> {
        if self.phase != SessionPhase::InProgress {
            return Err(SessionError::NotInProgress);
        }

        let question = self
            .assessment
            .question(self.index)
            .ok_or(SessionError::NotInProgress)?;
        if !question.has_option(choice) {
            return Err(SessionError::InvalidOption);
        }

        self.sheet.select(self.index, choice)?;
        Ok(())
    }

    /// Advance to the next question; a no-op on the last one.
    pub fn next(&mut self) -> usize {
        if self.phase == SessionPhase::InProgress && self.index + 1 < self.assessment.len() {
            self.index += 1;
        }
        self.index
    }

    /// Step back one question; a no-op on the first one.
    pub fn previous(&mut self) -> usize {
        if self.phase == SessionPhase::InProgress && self.index > 0 {
            self.index -= 1;
        }
        self.index
    }

    /// Move to `Submitting` with the given reason.
    ///
    /// Returns false if the attempt is not in progress (termination
    /// already claimed or setup never finished); callers must not score
    /// or write in that case.
    pub fn claim_termination(&mut self, reason: TerminationReason) -> bool {
        if self.phase != SessionPhase::InProgress {
            debug!(?reason, phase = ?self.phase, "termination claim rejected");
            return false;
        }
        self.phase = SessionPhase::Submitting;
        self.reason = Some(reason);
        true
    }

    /// Outcome durably recorded; the machine is final.
    pub fn finish(&mut self) {
        self.phase = SessionPhase::Terminated;
    }
}
