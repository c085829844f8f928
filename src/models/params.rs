//! Answer-option payloads for choice questions.

use serde::{Deserialize, Serialize};

use super::QuestionType;

/// A single answer option, e.g. `{ "key": "A", "value": "42" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceOption {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SingleChoiceParams {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MultipleChoiceParams {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub answer: Vec<String>,
}

/// Option payload keyed by question kind.
///
/// `None` is the variant for kinds that render no option editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QuestionParams {
    #[default]
    None,
    SingleChoice(SingleChoiceParams),
    MultipleChoice(MultipleChoiceParams),
}

impl QuestionParams {
    /// Empty payload of the shape `kind` expects.
    pub fn empty_for(kind: QuestionType) -> Self {
        match kind {
            QuestionType::SingleChoice => QuestionParams::SingleChoice(Default::default()),
            QuestionType::MultipleChoice => QuestionParams::MultipleChoice(Default::default()),
            QuestionType::QuestionAnswer | QuestionType::Programming => QuestionParams::None,
        }
    }

    /// Interpret a stored payload for `kind`. Payloads that do not fit the
    /// kind's shape yield the empty payload for that kind.
    pub fn from_value(kind: QuestionType, value: Option<&serde_json::Value>) -> Self {
        let Some(value) = value else {
            return Self::empty_for(kind);
        };
        match kind {
            QuestionType::SingleChoice => serde_json::from_value(value.clone())
                .map(QuestionParams::SingleChoice)
                .unwrap_or_else(|_| Self::empty_for(kind)),
            QuestionType::MultipleChoice => serde_json::from_value(value.clone())
                .map(QuestionParams::MultipleChoice)
                .unwrap_or_else(|_| Self::empty_for(kind)),
            QuestionType::QuestionAnswer | QuestionType::Programming => QuestionParams::None,
        }
    }

    /// Whether this payload has the shape `kind` expects.
    pub fn matches(&self, kind: QuestionType) -> bool {
        matches!(
            (self, kind),
            (QuestionParams::SingleChoice(_), QuestionType::SingleChoice)
                | (QuestionParams::MultipleChoice(_), QuestionType::MultipleChoice)
                | (QuestionParams::None, QuestionType::QuestionAnswer)
                | (QuestionParams::None, QuestionType::Programming)
        )
    }

    pub fn to_value(&self) -> Option<serde_json::Value> {
        match self {
            QuestionParams::None => None,
            QuestionParams::SingleChoice(params) => serde_json::to_value(params).ok(),
            QuestionParams::MultipleChoice(params) => serde_json::to_value(params).ok(),
        }
    }
}
