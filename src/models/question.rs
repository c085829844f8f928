//! Question model and its stable enumerations.

use serde::{Deserialize, Serialize};

use super::Document;

/// Question kind. Serialized as its integer code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub enum QuestionType {
    QuestionAnswer,
    SingleChoice,
    MultipleChoice,
    Programming,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::QuestionAnswer,
        QuestionType::SingleChoice,
        QuestionType::MultipleChoice,
        QuestionType::Programming,
    ];

    pub fn code(self) -> i64 {
        match self {
            QuestionType::QuestionAnswer => 0,
            QuestionType::SingleChoice => 1,
            QuestionType::MultipleChoice => 2,
            QuestionType::Programming => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Whether questions of this kind carry an answer-option payload.
    pub fn has_options(self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultipleChoice)
    }
}

impl TryFrom<i64> for QuestionType {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown question type {}", code))
    }
}

impl From<QuestionType> for i64 {
    fn from(kind: QuestionType) -> Self {
        kind.code()
    }
}

/// Question difficulty. Serialized as its integer code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn code(self) -> i64 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Difficulty::Easy),
            1 => Some(Difficulty::Medium),
            2 => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown difficulty {}", code))
    }
}

impl From<Difficulty> for i64 {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.code()
    }
}

/// Review lifecycle state. Serialized as its integer code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "i64", into = "i64")]
pub enum ReviewStatus {
    #[default]
    Reviewing,
    Pass,
    Reject,
}

impl ReviewStatus {
    pub fn code(self) -> i64 {
        match self {
            ReviewStatus::Reviewing => 0,
            ReviewStatus::Pass => 1,
            ReviewStatus::Reject => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ReviewStatus::Reviewing),
            1 => Some(ReviewStatus::Pass),
            2 => Some(ReviewStatus::Reject),
            _ => None,
        }
    }

    /// Parse the display form used by filter controls (`"0"`, `"1"`, `"2"`).
    pub fn parse_display(value: &str) -> Option<Self> {
        value.trim().parse::<i64>().ok().and_then(Self::from_code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Reviewing => "REVIEWING",
            ReviewStatus::Pass => "PASS",
            ReviewStatus::Reject => "REJECT",
        }
    }
}

impl TryFrom<i64> for ReviewStatus {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown review status {}", code))
    }
}

impl From<ReviewStatus> for i64 {
    fn from(status: ReviewStatus) -> Self {
        status.code()
    }
}

/// Default review weight for a question.
pub const DEFAULT_SCORE: i64 = 5;

fn default_score() -> i64 {
    DEFAULT_SCORE
}

/// A submitted question under moderation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub detail: Document,
    /// Answer-option payload; its shape depends on `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default = "default_score")]
    pub score: i64,
    pub review_status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
    #[serde(rename = "_createTime")]
    pub create_time: String,
    #[serde(rename = "_updateTime")]
    pub update_time: String,
    pub user_id: String,
    #[serde(default)]
    pub view_num: i64,
    #[serde(default)]
    pub comment_num: i64,
    #[serde(default)]
    pub favour_num: i64,
}

impl Question {
    /// Short title shown in the review queue.
    pub fn title(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => {
                let text = self.detail.plain_text();
                text.chars().take(40).collect()
            }
        }
    }
}

/// Edit patch produced by the edit form. Carries exactly the rendered fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub detail: Document,
    /// Present only when the kind renders an option editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Empty document when the reference carries no visible text.
    #[serde(default)]
    pub reference: Document,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    pub score: i64,
}

/// Request body for submitting a new question to the review queue.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub detail: Document,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    #[serde(default)]
    pub reference: Option<Document>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    /// Author id
    pub user_id: String,
}

impl CreateQuestionRequest {
    /// Field set of a new submission, as an edit patch at the default score.
    pub fn to_patch(&self) -> QuestionPatch {
        QuestionPatch {
            kind: self.kind,
            difficulty: self.difficulty,
            tags: self.tags.clone(),
            detail: self.detail.clone(),
            params: self.params.clone(),
            reference: self.reference.clone().unwrap_or_default(),
            name: self.name.clone(),
            priority: self.priority,
            score: DEFAULT_SCORE,
        }
    }
}

/// Request body for a review transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub score: i64,
    pub review_status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_status_display_form() {
        assert_eq!(ReviewStatus::parse_display("1"), Some(ReviewStatus::Pass));
        assert_eq!(ReviewStatus::parse_display(" 0 "), Some(ReviewStatus::Reviewing));
        assert_eq!(ReviewStatus::parse_display("7"), None);
        assert_eq!(ReviewStatus::parse_display("PASS"), None);
    }

    #[test]
    fn test_enums_serialize_as_codes() {
        let json = serde_json::to_string(&(QuestionType::MultipleChoice, ReviewStatus::Reject))
            .unwrap();
        assert_eq!(json, "[2,2]");
        let kind: QuestionType = serde_json::from_str("1").unwrap();
        assert_eq!(kind, QuestionType::SingleChoice);
        assert!(serde_json::from_str::<Difficulty>("9").is_err());
    }

    #[test]
    fn test_question_wire_names() {
        let json = serde_json::json!({
            "_id": "q1",
            "type": 1,
            "difficulty": 0,
            "tags": ["math"],
            "detail": "<p>1 + 1 = ?</p>",
            "reviewStatus": 0,
            "_createTime": "2024-01-01T00:00:00Z",
            "_updateTime": "2024-01-01T00:00:00Z",
            "userId": "u1"
        });
        let question: Question = serde_json::from_value(json).unwrap();
        assert_eq!(question.kind, QuestionType::SingleChoice);
        assert_eq!(question.score, DEFAULT_SCORE);
        assert_eq!(question.title(), "1 + 1 = ?");
    }
}
