use serde::{Deserialize, Serialize};

/// One training example. Field names double as the sink's column headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        QaPair {
            question: question.into(),
            answer: answer.into(),
        }
    }
}
