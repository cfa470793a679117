use serde::{Deserialize, Serialize};

/// A question/answer record under duplicate review.
///
/// Records are read-only input to the engine, identified by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub document_id: String,
    pub document_name: String,
    #[serde(default = "default_classification")]
    pub classification: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_classification() -> String {
    "-".to_string()
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            document_id: String::new(),
            document_name: String::new(),
            classification: default_classification(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Attach the document this record was loaded from
    #[must_use]
    pub fn with_document(
        mut self,
        document_id: impl Into<String>,
        document_name: impl Into<String>,
    ) -> Self {
        self.document_id = document_id.into();
        self.document_name = document_name.into();
        self
    }

    /// The text sent to the embedding service, question and answer combined
    pub fn embedding_text(&self) -> String {
        format!("问:{}\n答:{}", self.question, self.answer)
    }
}

/// Working copy of a [`Record`] annotated with its similarity to the group anchor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: Record,
    pub similarity_score: f64,
}

impl ScoredRecord {
    pub fn new(record: Record, similarity_score: f64) -> Self {
        Self {
            record,
            similarity_score,
        }
    }
}
