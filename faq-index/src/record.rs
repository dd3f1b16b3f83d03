//! Core data models used by the library.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::IndexError;

/// One question/answer pair of the lookup table.
///
/// Its position in the lookup table is its identity and always equals the
/// position of its vector in the similarity index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Raw corpus row before filtering.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CorpusRow {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// A single search result: entry position and squared L2 distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchHit {
    pub index: usize,
    pub distance: f32,
}

/// Which text of an entry is fed to the embedder at build time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingInput {
    /// Embed the question only.
    Question,
    /// Embed `question + " " + answer`.
    #[default]
    QuestionAndAnswer,
}

impl EmbeddingInput {
    /// Builds the embedder input for one entry.
    pub fn text_for(self, entry: &FaqEntry) -> String {
        match self {
            EmbeddingInput::Question => entry.question.clone(),
            EmbeddingInput::QuestionAndAnswer => format!("{} {}", entry.question, entry.answer),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingInput::Question => "question",
            EmbeddingInput::QuestionAndAnswer => "question_answer",
        }
    }
}

impl fmt::Display for EmbeddingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingInput {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "question" => Ok(EmbeddingInput::Question),
            "question_answer" | "question+answer" | "qa" => Ok(EmbeddingInput::QuestionAndAnswer),
            other => Err(IndexError::Config(format!(
                "unknown embedding input `{other}` (expected question | question_answer)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_text_follows_policy() {
        let e = FaqEntry {
            question: "What is COVID-19?".into(),
            answer: "A viral respiratory illness.".into(),
        };
        assert_eq!(EmbeddingInput::Question.text_for(&e), "What is COVID-19?");
        assert_eq!(
            EmbeddingInput::QuestionAndAnswer.text_for(&e),
            "What is COVID-19? A viral respiratory illness."
        );
    }

    #[test]
    fn embedding_input_parses() {
        assert_eq!("Question".parse::<EmbeddingInput>().unwrap(), EmbeddingInput::Question);
        assert_eq!(
            "question_answer".parse::<EmbeddingInput>().unwrap(),
            EmbeddingInput::QuestionAndAnswer
        );
        assert!("answer".parse::<EmbeddingInput>().is_err());
    }
}
