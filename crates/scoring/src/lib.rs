//! Scoring Engine
//!
//! Pure mapping from (assessment, answer sheet) to a numeric score.
//! Two policies are supported, matching the two grading schemes the
//! product has shipped:
//! - [`ScoringPolicy::PointCount`]: one point per correct answer, floored
//!   point total. Unanswered and wrong entries score zero.
//! - [`ScoringPolicy::PenalizedPercent`]: +1 per correct answer, -0.25 per
//!   answered-but-wrong entry, normalized to a 0-100 scale and floored.
//!   Unanswered entries carry no penalty.
//!
//! Identical inputs always produce identical scores; there is no
//! randomness and no dependence on answer order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use question_bank::{AnswerSheet, Assessment};

/// Grading policy applied at submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringPolicy {
    /// One point per correct answer
    #[default]
    PointCount,
    /// Penalized points normalized to 0-100
    PenalizedPercent,
}

/// Raw correct/wrong/unanswered tally for an answer sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub correct: usize,
    pub wrong: usize,
    pub unanswered: usize,
}

/// Count correct, wrong, and unanswered entries.
///
/// Entries are compared by value against each question's correct option;
/// an entry for a choice outside the option list counts as wrong.
pub fn tally(assessment: &Assessment, sheet: &AnswerSheet) -> Tally {
    let mut correct = 0;
    let mut wrong = 0;
    let mut unanswered = 0;

    for (index, question) in assessment.questions().iter().enumerate() {
        match sheet.choice(index) {
            Some(choice) if question.is_correct(choice) => correct += 1,
            Some(_) => wrong += 1,
            None => unanswered += 1,
        }
    }

    Tally {
        correct,
        wrong,
        unanswered,
    }
}

/// Compute the final score under the given policy.
pub fn score(assessment: &Assessment, sheet: &AnswerSheet, policy: ScoringPolicy) -> u32 {
    let t = tally(assessment, sheet);

    let value = match policy {
        ScoringPolicy::PointCount => t.correct as u32,
        ScoringPolicy::PenalizedPercent => {
            let points = t.correct as f64 - 0.25 * t.wrong as f64;
            let percent = 100.0 * points / assessment.len() as f64;
            percent.max(0.0).floor() as u32
        }
    };

    debug!(
        correct = t.correct,
        wrong = t.wrong,
        unanswered = t.unanswered,
        ?policy,
        value,
        "answer sheet scored"
    );
    value
}
