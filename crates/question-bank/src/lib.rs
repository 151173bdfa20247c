//! Question Bank
//!
//! Data model for externally generated multiple-choice assessments:
//! - Validated questions (four options, correct answer among them)
//! - Ordered assessments bound to a job identifier
//! - Append/overwrite answer sheets with strict index bounds
//! - Bank retrieval behind a narrow trait, with JSON loading for sets
//!   produced by the generation pipeline

pub mod bank;
pub mod question;

pub use bank::{InMemoryBank, QuestionBank};
pub use question::{AnswerSheet, Assessment, Question, OPTIONS_PER_QUESTION};

use thiserror::Error;

/// Question bank error types
#[derive(Error, Debug)]
pub enum BankError {
    #[error("Expected {OPTIONS_PER_QUESTION} options, got {0}")]
    OptionCount(usize),

    #[error("Correct answer is not one of the options")]
    CorrectAnswerMissing,

    #[error("Question index {index} out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Assessment has no questions")]
    Empty,

    #[error("Malformed question set: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Bank unavailable: {0}")]
    Unavailable(String),
}
