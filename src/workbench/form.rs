//! Editable draft of the selected question.
//!
//! The draft is a separate value from the fetched record; it is only turned
//! into a patch on explicit submit. The option payload is keyed by the
//! draft's kind and is replaced whenever the kind changes.

use std::fmt;

use crate::errors::AppError;
use crate::models::{
    Difficulty, Document, Question, QuestionParams, QuestionPatch, QuestionType, DEFAULT_SCORE,
};

/// Form limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormLimits {
    /// Tags a question may carry.
    pub max_tags: usize,
    /// Tags the selector lets the reviewer pick before validation.
    pub max_selectable_tags: usize,
    pub max_name_chars: usize,
    pub min_score: i64,
    pub max_score: i64,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            max_tags: 5,
            max_selectable_tags: 20,
            max_name_chars: 100,
            min_score: 0,
            max_score: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Kind,
    Difficulty,
    Tags,
    Detail,
    Params,
    Reference,
    Name,
    Priority,
    Score,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Kind => "type",
            FormField::Difficulty => "difficulty",
            FormField::Tags => "tags",
            FormField::Detail => "detail",
            FormField::Params => "params",
            FormField::Reference => "reference",
            FormField::Name => "name",
            FormField::Priority => "priority",
            FormField::Score => "score",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    TooManyTags { max: usize },
    TooLong { max: usize },
    OutOfRange { min: i64, max: Option<i64> },
    ShapeMismatch,
}

/// A constraint violation reported inline at a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub kind: FieldErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field.as_str();
        match &self.kind {
            FieldErrorKind::Required => write!(f, "{} is required", field),
            FieldErrorKind::TooManyTags { max } => write!(f, "at most {} tags", max),
            FieldErrorKind::TooLong { max } => write!(f, "{} exceeds {} characters", field, max),
            FieldErrorKind::OutOfRange { min, max: Some(max) } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            FieldErrorKind::OutOfRange { min, max: None } => {
                write!(f, "{} must be at least {}", field, min)
            }
            FieldErrorKind::ShapeMismatch => {
                write!(f, "{} do not match the question type", field)
            }
        }
    }
}

/// Every violation found by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn for_field(&self, field: FormField) -> impl Iterator<Item = &FieldError> {
        self.0.iter().filter(move |e| e.field == field)
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl From<FormErrors> for AppError {
    fn from(errors: FormErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Field values of the edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub kind: Option<QuestionType>,
    pub difficulty: Option<Difficulty>,
    pub tags: Vec<String>,
    pub detail: Document,
    pub params: QuestionParams,
    pub reference: Document,
    pub name: String,
    pub priority: Option<i64>,
    pub score: i64,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            kind: None,
            difficulty: None,
            tags: Vec::new(),
            detail: Document::empty(),
            params: QuestionParams::None,
            reference: Document::empty(),
            name: String::new(),
            priority: None,
            score: DEFAULT_SCORE,
        }
    }
}

impl QuestionDraft {
    pub fn from_question(question: &Question) -> Self {
        Self {
            kind: Some(question.kind),
            difficulty: Some(question.difficulty),
            tags: question.tags.clone(),
            detail: question.detail.clone(),
            params: QuestionParams::from_value(question.kind, question.params.as_ref()),
            reference: question.reference.clone().unwrap_or_default(),
            name: question.name.clone().unwrap_or_default(),
            priority: question.priority,
            score: question.score,
        }
    }

    /// Draft holding the fields of a received patch.
    pub fn from_patch(patch: &QuestionPatch) -> Self {
        Self {
            kind: Some(patch.kind),
            difficulty: Some(patch.difficulty),
            tags: patch.tags.clone(),
            detail: patch.detail.clone(),
            params: QuestionParams::from_value(patch.kind, patch.params.as_ref()),
            reference: patch.reference.clone(),
            name: patch.name.clone().unwrap_or_default(),
            priority: patch.priority,
            score: patch.score,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditForm {
    limits: FormLimits,
    draft: QuestionDraft,
}

impl EditForm {
    pub fn new(limits: FormLimits) -> Self {
        Self {
            limits,
            draft: QuestionDraft::default(),
        }
    }

    pub fn limits(&self) -> &FormLimits {
        &self.limits
    }

    pub fn draft(&self) -> &QuestionDraft {
        &self.draft
    }

    /// Back to initial values.
    pub fn reset(&mut self) {
        self.draft = QuestionDraft::default();
    }

    /// Mirror a fetched record into the draft, discarding previous edits.
    pub fn load(&mut self, question: &Question) {
        self.draft = QuestionDraft::from_question(question);
    }

    /// Replace the draft with the fields of a received patch, so it can be
    /// validated and normalized like a local edit.
    pub fn load_patch(&mut self, patch: &QuestionPatch) {
        self.draft = QuestionDraft::from_patch(patch);
    }

    pub fn kind(&self) -> Option<QuestionType> {
        self.draft.kind
    }

    /// Current score, as edited.
    pub fn score(&self) -> i64 {
        self.draft.score
    }

    /// Which option editor is rendered, if any.
    pub fn params_editor(&self) -> Option<QuestionType> {
        self.draft.kind.filter(|kind| kind.has_options())
    }

    /// Change the kind. A different kind swaps in an empty payload of the
    /// new shape.
    pub fn set_kind(&mut self, kind: QuestionType) {
        if self.draft.kind != Some(kind) {
            self.draft.params = QuestionParams::empty_for(kind);
        }
        self.draft.kind = Some(kind);
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.draft.difficulty = Some(difficulty);
    }

    /// Replace the tag selection. The selector refuses more than
    /// `max_selectable_tags`.
    pub fn set_tags(&mut self, tags: Vec<String>) -> Result<(), FieldError> {
        if tags.len() > self.limits.max_selectable_tags {
            return Err(FieldError {
                field: FormField::Tags,
                kind: FieldErrorKind::TooManyTags {
                    max: self.limits.max_selectable_tags,
                },
            });
        }
        self.draft.tags = tags;
        Ok(())
    }

    pub fn set_detail(&mut self, detail: Document) {
        self.draft.detail = detail;
    }

    /// Trimmed plain text of the content field, as fed to the similarity probe.
    pub fn detail_text(&self) -> String {
        self.draft.detail.plain_text()
    }

    /// Replace the option payload. It must have the shape of the current kind.
    pub fn set_params(&mut self, params: QuestionParams) -> Result<(), FieldError> {
        let fits = self.draft.kind.is_some_and(|kind| params.matches(kind));
        if !fits {
            return Err(FieldError {
                field: FormField::Params,
                kind: FieldErrorKind::ShapeMismatch,
            });
        }
        self.draft.params = params;
        Ok(())
    }

    pub fn set_reference(&mut self, reference: Document) {
        self.draft.reference = reference;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_priority(&mut self, priority: Option<i64>) {
        self.draft.priority = priority;
    }

    pub fn set_score(&mut self, score: i64) {
        self.draft.score = score;
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let draft = &self.draft;
        let limits = &self.limits;
        let mut errors = Vec::new();
        let mut push = |field, kind| errors.push(FieldError { field, kind });

        if draft.kind.is_none() {
            push(FormField::Kind, FieldErrorKind::Required);
        }
        if draft.difficulty.is_none() {
            push(FormField::Difficulty, FieldErrorKind::Required);
        }
        if draft.tags.is_empty() {
            push(FormField::Tags, FieldErrorKind::Required);
        } else if draft.tags.len() > limits.max_tags {
            push(
                FormField::Tags,
                FieldErrorKind::TooManyTags {
                    max: limits.max_tags,
                },
            );
        }
        if !draft.detail.has_text() {
            push(FormField::Detail, FieldErrorKind::Required);
        }
        if let Some(kind) = draft.kind {
            if !draft.params.matches(kind) {
                push(FormField::Params, FieldErrorKind::ShapeMismatch);
            }
        }
        if draft.name.chars().count() > limits.max_name_chars {
            push(
                FormField::Name,
                FieldErrorKind::TooLong {
                    max: limits.max_name_chars,
                },
            );
        }
        if draft.priority.is_some_and(|p| p < 0) {
            push(
                FormField::Priority,
                FieldErrorKind::OutOfRange { min: 0, max: None },
            );
        }
        if !(limits.min_score..=limits.max_score).contains(&draft.score) {
            push(
                FormField::Score,
                FieldErrorKind::OutOfRange {
                    min: limits.min_score,
                    max: Some(limits.max_score),
                },
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FormErrors(errors))
        }
    }

    /// Validate and produce the patch for the rendered fields.
    pub fn to_patch(&self) -> Result<QuestionPatch, FormErrors> {
        self.validate()?;
        let draft = &self.draft;
        let (Some(kind), Some(difficulty)) = (draft.kind, draft.difficulty) else {
            return Err(FormErrors(Vec::new()));
        };
        let name = draft.name.trim();
        Ok(QuestionPatch {
            kind,
            difficulty,
            tags: draft.tags.clone(),
            detail: draft.detail.clone(),
            params: if kind.has_options() {
                draft.params.to_value()
            } else {
                None
            },
            reference: draft.reference.clone().normalized(),
            name: (!name.is_empty()).then(|| name.to_string()),
            priority: draft.priority,
            score: draft.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChoiceOption, MultipleChoiceParams, ReviewStatus, SingleChoiceParams};
    use serde_json::json;

    fn single_choice_question() -> Question {
        Question {
            id: "a".into(),
            kind: QuestionType::SingleChoice,
            difficulty: Difficulty::Medium,
            tags: vec!["math".into()],
            detail: Document::new("<p>1 + 1 = ?</p>"),
            params: Some(json!({
                "options": [{ "key": "A", "value": "2" }, { "key": "B", "value": "3" }],
                "answer": "A"
            })),
            reference: Some(Document::new("<p>arithmetic</p>")),
            name: Some("Addition".into()),
            priority: Some(3),
            score: 5,
            review_status: ReviewStatus::Reviewing,
            review_message: None,
            review_time: None,
            publish_time: None,
            create_time: "2024-01-01T00:00:00Z".into(),
            update_time: "2024-01-01T00:00:00Z".into(),
            user_id: "author".into(),
            view_num: 0,
            comment_num: 0,
            favour_num: 0,
        }
    }

    fn loaded_form() -> EditForm {
        let mut form = EditForm::new(FormLimits::default());
        form.load(&single_choice_question());
        form
    }

    #[test]
    fn test_load_mirrors_record() {
        let form = loaded_form();
        assert_eq!(form.params_editor(), Some(QuestionType::SingleChoice));
        let QuestionParams::SingleChoice(params) = &form.draft().params else {
            panic!("expected single-choice payload");
        };
        assert_eq!(params.answer.as_deref(), Some("A"));
        assert_eq!(form.draft().name, "Addition");
    }

    #[test]
    fn test_switching_kind_discards_stale_params() {
        let mut form = loaded_form();
        form.set_kind(QuestionType::MultipleChoice);
        assert_eq!(
            form.draft().params,
            QuestionParams::MultipleChoice(MultipleChoiceParams::default())
        );
        assert_eq!(form.params_editor(), Some(QuestionType::MultipleChoice));

        form.set_kind(QuestionType::SingleChoice);
        assert_eq!(
            form.draft().params,
            QuestionParams::SingleChoice(SingleChoiceParams::default())
        );
    }

    #[test]
    fn test_setting_same_kind_keeps_params() {
        let mut form = loaded_form();
        let before = form.draft().params.clone();
        form.set_kind(QuestionType::SingleChoice);
        assert_eq!(form.draft().params, before);
    }

    #[test]
    fn test_non_choice_kind_has_no_editor_and_no_params_in_patch() {
        let mut form = loaded_form();
        form.set_kind(QuestionType::QuestionAnswer);
        assert_eq!(form.params_editor(), None);
        let patch = form.to_patch().unwrap();
        assert_eq!(patch.params, None);
        let body = serde_json::to_value(&patch).unwrap();
        assert!(body.get("params").is_none());
    }

    #[test]
    fn test_params_shape_must_match_kind() {
        let mut form = loaded_form();
        let err = form
            .set_params(QuestionParams::MultipleChoice(MultipleChoiceParams::default()))
            .unwrap_err();
        assert_eq!(err.kind, FieldErrorKind::ShapeMismatch);

        form.set_params(QuestionParams::SingleChoice(SingleChoiceParams {
            options: vec![ChoiceOption {
                key: "A".into(),
                value: "4".into(),
            }],
            answer: Some("A".into()),
        }))
        .unwrap();
        let patch = form.to_patch().unwrap();
        assert_eq!(patch.params.unwrap()["options"][0]["value"], "4");
    }

    #[test]
    fn test_empty_reference_is_sent_as_empty_value() {
        let mut form = loaded_form();
        form.set_reference(Document::new("<p><br></p>"));
        let patch = form.to_patch().unwrap();
        assert_eq!(patch.reference, Document::empty());
        assert_eq!(serde_json::to_value(&patch).unwrap()["reference"], "");
    }

    #[test]
    fn test_required_fields() {
        let form = EditForm::new(FormLimits::default());
        let errors = form.validate().unwrap_err();
        for field in [
            FormField::Kind,
            FormField::Difficulty,
            FormField::Tags,
            FormField::Detail,
        ] {
            assert_eq!(
                errors.for_field(field).next().map(|e| &e.kind),
                Some(&FieldErrorKind::Required),
                "{:?}",
                field
            );
        }
    }

    #[test]
    fn test_tag_count_errors_are_distinct() {
        let mut form = loaded_form();
        form.set_tags((0..6).map(|i| format!("t{}", i)).collect())
            .unwrap();
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.for_field(FormField::Tags).next().map(|e| &e.kind),
            Some(&FieldErrorKind::TooManyTags { max: 5 })
        );

        let err = form
            .set_tags((0..21).map(|i| format!("t{}", i)).collect())
            .unwrap_err();
        assert_eq!(err.kind, FieldErrorKind::TooManyTags { max: 20 });
        assert_eq!(form.draft().tags.len(), 6);
    }

    #[test]
    fn test_bounds() {
        let mut form = loaded_form();
        form.set_name("x".repeat(101));
        form.set_priority(Some(-1));
        form.set_score(9);
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.0.len(), 3);
        assert!(errors.for_field(FormField::Name).next().is_some());
        assert!(errors.for_field(FormField::Priority).next().is_some());
        assert!(errors.for_field(FormField::Score).next().is_some());

        form.set_name("x".repeat(100));
        form.set_priority(Some(0));
        form.set_score(8);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_default_score_and_reset() {
        let mut form = loaded_form();
        form.set_score(2);
        form.reset();
        assert_eq!(form.score(), DEFAULT_SCORE);
        assert_eq!(form.kind(), None);
    }

    #[test]
    fn test_form_errors_convert_to_validation() {
        let form = EditForm::new(FormLimits::default());
        let err: AppError = form.validate().unwrap_err().into();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("type is required")));
    }
}
