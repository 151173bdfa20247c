//! Bank retrieval trait and in-memory implementation

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, info};

use crate::question::{Assessment, Question};
use crate::BankError;

/// Read-only access to previously generated question sets.
pub trait QuestionBank: Send + Sync {
    /// Fetch the assessment generated for a job posting, if one exists.
    fn fetch(&self, job_id: &str) -> Result<Option<Assessment>, BankError>;
}

/// In-memory bank keyed by job identifier
pub struct InMemoryBank {
    sets: Mutex<HashMap<String, Assessment>>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self {
            sets: Mutex::new(HashMap::new()),
        }
    }

    /// Store a generated assessment, replacing any prior set for the job
    pub fn insert(&self, assessment: Assessment) -> Result<(), BankError> {
        let mut sets = self
            .sets
            .lock()
            .map_err(|e| BankError::Unavailable(e.to_string()))?;
        info!(
            job_id = assessment.job_id(),
            questions = assessment.len(),
            "question set stored"
        );
        sets.insert(assessment.job_id().to_string(), assessment);
        Ok(())
    }

    /// Load a generated question set from its JSON wire format
    pub fn insert_json(&self, job_id: &str, json: &str) -> Result<(), BankError> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        let assessment = Assessment::new(job_id, questions)?;
        self.insert(assessment)
    }
}

impl Default for InMemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionBank for InMemoryBank {
    fn fetch(&self, job_id: &str) -> Result<Option<Assessment>, BankError> {
        let sets = self
            .sets
            .lock()
            .map_err(|e| BankError::Unavailable(e.to_string()))?;
        let found = sets.get(job_id).cloned();
        debug!(job_id, found = found.is_some(), "question set lookup");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_missing_set() {
        let bank = InMemoryBank::new();
        assert!(bank.fetch("job-1").unwrap().is_none());
    }

    #[test]
    fn test_insert_json_and_fetch() {
        let bank = InMemoryBank::new();
        let json = r#"[
            {
                "question": "3*3?",
                "options": ["6", "9", "12", "3"],
                "correctAnswer": "9"
            },
            {
                "question": "Largest planet?",
                "options": ["Mars", "Venus", "Jupiter", "Saturn"],
                "correctAnswer": "Jupiter"
            }
        ]"#;
        bank.insert_json("job-1", json).unwrap();

        let assessment = bank.fetch("job-1").unwrap().unwrap();
        assert_eq!(assessment.len(), 2);
        assert_eq!(assessment.question(1).unwrap().prompt(), "Largest planet?");
    }

    #[test]
    fn test_insert_json_rejects_empty_set() {
        let bank = InMemoryBank::new();
        assert!(matches!(
            bank.insert_json("job-1", "[]"),
            Err(BankError::Empty)
        ));
    }
}
