//! Questions, assessments, and answer sheets

use serde::{Deserialize, Serialize};

use crate::BankError;

/// Every question carries exactly this many answer options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A single multiple-choice question.
///
/// Immutable once constructed; identity is its position in the
/// assessment's question list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    prompt: String,
    options: [String; OPTIONS_PER_QUESTION],
    correct: String,
}

/// Wire shape of a generated question (camelCase keys from the
/// generation pipeline).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    question: String,
    options: Vec<String>,
    correct_answer: String,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = BankError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Question::new(record.question, record.options, record.correct_answer)
    }
}

impl From<Question> for QuestionRecord {
    fn from(q: Question) -> Self {
        Self {
            question: q.prompt,
            options: q.options.to_vec(),
            correct_answer: q.correct,
        }
    }
}

impl Question {
    /// Build a validated question: four options, correct answer among them.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: impl Into<String>,
    ) -> Result<Self, BankError> {
        let correct = correct.into();
        let options: [String; OPTIONS_PER_QUESTION] = options
            .try_into()
            .map_err(|v: Vec<String>| BankError::OptionCount(v.len()))?;

        if !options.contains(&correct) {
            return Err(BankError::CorrectAnswerMissing);
        }

        Ok(Self {
            prompt: prompt.into(),
            options,
            correct,
        })
    }

    /// Question prompt text
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The four answer options, in presentation order
    pub fn options(&self) -> &[String; OPTIONS_PER_QUESTION] {
        &self.options
    }

    /// Whether `choice` is one of this question's options
    pub fn has_option(&self, choice: &str) -> bool {
        self.options.iter().any(|o| o == choice)
    }

    /// Whether `choice` is the correct option
    pub fn is_correct(&self, choice: &str) -> bool {
        self.correct == choice
    }
}

/// An ordered, fixed-length question set bound to a job posting.
///
/// Created by the external generation process; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    job_id: String,
    questions: Vec<Question>,
}

impl Assessment {
    pub fn new(job_id: impl Into<String>, questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        Ok(Self {
            job_id: job_id.into(),
            questions,
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

/// The candidate's chosen options, indexed by question position.
///
/// Entries are overwritten, never removed; indices outside the
/// assessment are rejected.
#[derive(Debug, Clone)]
pub struct AnswerSheet {
    choices: Vec<Option<String>>,
}

impl AnswerSheet {
    /// Empty sheet for an assessment of `len` questions
    pub fn new(len: usize) -> Self {
        Self {
            choices: vec![None; len],
        }
    }

    /// Record (or overwrite) the choice for one question
    pub fn select(&mut self, index: usize, choice: impl Into<String>) -> Result<(), BankError> {
        let len = self.choices.len();
        let slot = self
            .choices
            .get_mut(index)
            .ok_or(BankError::IndexOutOfRange { index, len })?;
        *slot = Some(choice.into());
        Ok(())
    }

    /// The recorded choice for a question, if any
    pub fn choice(&self, index: usize) -> Option<&str> {
        self.choices.get(index).and_then(|c| c.as_deref())
    }

    /// Number of answered questions
    pub fn answered(&self) -> usize {
        self.choices.iter().filter(|c| c.is_some()).count()
    }

    /// Total number of questions the sheet covers
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Whether every question has an answer
    pub fn is_complete(&self) -> bool {
        self.choices.iter().all(|c| c.is_some())
    }
}
