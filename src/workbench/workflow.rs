//! Review lifecycle state machine and mutating actions.
//!
//! At most one mutation (edit submission, approval, rejection) is in flight
//! at a time. While one is pending, the other actions are no-ops.

use super::backend::ReviewTransition;
use super::form::{EditForm, FieldErrorKind, FormErrors, FieldError, FormField};
use crate::errors::AppError;
use crate::models::{Principal, QuestionPatch, ReviewStatus};

/// States reachable from `from` through a review action.
///
/// Every state may move to `Pass` or `Reject`; nothing moves back to
/// `Reviewing`.
pub fn allowed_transitions(from: ReviewStatus) -> &'static [ReviewStatus] {
    match from {
        ReviewStatus::Reviewing | ReviewStatus::Pass | ReviewStatus::Reject => {
            &[ReviewStatus::Pass, ReviewStatus::Reject]
        }
    }
}

/// Validates a review transition.
pub fn validate_transition(from: ReviewStatus, to: ReviewStatus) -> Result<(), AppError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Illegal review transition {} -> {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    SubmitEdit,
    Approve,
    Reject,
}

/// A mutating request ready to be sent to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationRequest {
    Update {
        question_id: String,
        patch: QuestionPatch,
    },
    Transition(ReviewTransition),
}

impl MutationRequest {
    pub fn kind(&self) -> MutationKind {
        match self {
            MutationRequest::Update { .. } => MutationKind::SubmitEdit,
            MutationRequest::Transition(t) if t.target == ReviewStatus::Reject => {
                MutationKind::Reject
            }
            MutationRequest::Transition(_) => MutationKind::Approve,
        }
    }
}

/// What an action may rely on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionContext<'a> {
    pub principal: Option<&'a Principal>,
    pub selected_id: Option<&'a str>,
}

/// Open reason-capture step for a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectDialog {
    pub question_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewWorkflow {
    in_flight: Option<MutationRequest>,
    reject_dialog: Option<RejectDialog>,
}

impl ReviewWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&MutationRequest> {
        self.in_flight.as_ref()
    }

    /// Submit, approve and reject are enabled together.
    pub fn actions_enabled(&self, has_selection: bool) -> bool {
        has_selection && !self.is_busy()
    }

    pub fn reject_dialog(&self) -> Option<&RejectDialog> {
        self.reject_dialog.as_ref()
    }

    fn require_target<'a>(ctx: &ActionContext<'a>, action: &str) -> Result<&'a str, AppError> {
        if ctx.principal.is_none() {
            return Err(AppError::Precondition(format!(
                "Sign in before you {}",
                action
            )));
        }
        ctx.selected_id
            .ok_or_else(|| AppError::Precondition("Select a question first".to_string()))
    }

    fn live_score(form: &EditForm) -> Result<i64, AppError> {
        let limits = form.limits();
        let score = form.score();
        if (limits.min_score..=limits.max_score).contains(&score) {
            Ok(score)
        } else {
            Err(FormErrors(vec![FieldError {
                field: FormField::Score,
                kind: FieldErrorKind::OutOfRange {
                    min: limits.min_score,
                    max: Some(limits.max_score),
                },
            }])
            .into())
        }
    }

    fn issue(&mut self, request: MutationRequest) -> Option<MutationRequest> {
        self.in_flight = Some(request.clone());
        Some(request)
    }

    /// Build the edit submission. `Ok(None)` while another mutation is pending.
    pub fn begin_submit(
        &mut self,
        ctx: ActionContext<'_>,
        form: &EditForm,
    ) -> Result<Option<MutationRequest>, AppError> {
        if self.is_busy() {
            return Ok(None);
        }
        let question_id = Self::require_target(&ctx, "submit")?;
        let patch = form.to_patch()?;
        Ok(self.issue(MutationRequest::Update {
            question_id: question_id.to_string(),
            patch,
        }))
    }

    /// Build the approval, carrying the score as currently edited.
    pub fn begin_approve(
        &mut self,
        ctx: ActionContext<'_>,
        form: &EditForm,
    ) -> Result<Option<MutationRequest>, AppError> {
        if self.is_busy() {
            return Ok(None);
        }
        let question_id = Self::require_target(&ctx, "approve")?;
        let score = Self::live_score(form)?;
        Ok(self.issue(MutationRequest::Transition(ReviewTransition {
            question_id: question_id.to_string(),
            score,
            target: ReviewStatus::Pass,
            reason: None,
        })))
    }

    /// Open the reason-capture step for the selected question.
    /// Returns `false` while another mutation is pending.
    pub fn open_reject(&mut self, ctx: ActionContext<'_>) -> Result<bool, AppError> {
        if self.is_busy() {
            return Ok(false);
        }
        let question_id = Self::require_target(&ctx, "reject")?;
        self.reject_dialog = Some(RejectDialog {
            question_id: question_id.to_string(),
        });
        Ok(true)
    }

    /// Close the reason-capture step without side effects. A rejection
    /// already sent cannot be canceled.
    pub fn cancel_reject(&mut self) -> bool {
        if matches!(self.in_flight, Some(MutationRequest::Transition(ref t)) if t.target == ReviewStatus::Reject)
        {
            return false;
        }
        self.reject_dialog.take().is_some()
    }

    /// Drop the reason-capture step when the selection changes. A rejection
    /// already sent keeps its dialog until it resolves.
    pub fn dismiss_reject(&mut self) {
        let rejecting = matches!(self.in_flight, Some(ref r) if r.kind() == MutationKind::Reject);
        if !rejecting {
            self.reject_dialog = None;
        }
    }

    /// Build the rejection for the open dialog with the captured reason.
    pub fn begin_reject(
        &mut self,
        ctx: ActionContext<'_>,
        form: &EditForm,
        reason: &str,
    ) -> Result<Option<MutationRequest>, AppError> {
        if self.is_busy() {
            return Ok(None);
        }
        let Some(dialog) = self.reject_dialog.clone() else {
            return Err(AppError::Precondition(
                "Open the rejection dialog first".to_string(),
            ));
        };
        let question_id = Self::require_target(&ctx, "reject")?;
        if question_id != dialog.question_id {
            self.reject_dialog = None;
            return Err(AppError::Precondition(
                "The rejection dialog belongs to another question".to_string(),
            ));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation(
                "A rejection reason is required".to_string(),
            ));
        }
        let score = Self::live_score(form)?;
        Ok(self.issue(MutationRequest::Transition(ReviewTransition {
            question_id: dialog.question_id,
            score,
            target: ReviewStatus::Reject,
            reason: Some(reason.to_string()),
        })))
    }

    /// Resolve the pending mutation and clear the busy flag.
    pub fn finish(&mut self, result: Result<(), AppError>) -> Result<MutationRequest, AppError> {
        let request = self
            .in_flight
            .take()
            .ok_or_else(|| AppError::Internal("No review action in flight".to_string()))?;
        result?;
        if request.kind() == MutationKind::Reject {
            self.reject_dialog = None;
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Difficulty, Document, ExtraAuthority, Question, QuestionType, Role,
    };
    use crate::workbench::form::FormLimits;

    fn principal() -> Principal {
        Principal {
            id: "reviewer".into(),
            display_name: "Reviewer".into(),
            avatar_url: None,
            role: Role::Admin,
            extra_authority: ExtraAuthority::default(),
        }
    }

    fn form() -> EditForm {
        let mut form = EditForm::new(FormLimits::default());
        form.load(&Question {
            id: "q1".into(),
            kind: QuestionType::QuestionAnswer,
            difficulty: Difficulty::Easy,
            tags: vec!["math".into()],
            detail: Document::new("<p>Explain ownership</p>"),
            params: None,
            reference: None,
            name: None,
            priority: None,
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
        });
        form
    }

    fn ctx(principal: &Principal) -> ActionContext<'_> {
        ActionContext {
            principal: Some(principal),
            selected_id: Some("q1"),
        }
    }

    #[test]
    fn test_no_transition_back_to_reviewing() {
        for from in [ReviewStatus::Reviewing, ReviewStatus::Pass, ReviewStatus::Reject] {
            assert!(validate_transition(from, ReviewStatus::Pass).is_ok());
            assert!(validate_transition(from, ReviewStatus::Reject).is_ok());
            assert!(validate_transition(from, ReviewStatus::Reviewing).is_err());
        }
    }

    #[test]
    fn test_approve_uses_live_score() {
        let principal = principal();
        let mut form = form();
        form.set_score(7);
        let mut workflow = ReviewWorkflow::new();
        let request = workflow.begin_approve(ctx(&principal), &form).unwrap().unwrap();
        assert_eq!(
            request,
            MutationRequest::Transition(ReviewTransition {
                question_id: "q1".into(),
                score: 7,
                target: ReviewStatus::Pass,
                reason: None,
            })
        );
        assert!(workflow.is_busy());
        assert!(!workflow.actions_enabled(true));
    }

    #[test]
    fn test_pending_mutation_blocks_other_actions() {
        let principal = principal();
        let form = form();
        let mut workflow = ReviewWorkflow::new();
        let first = workflow.begin_submit(ctx(&principal), &form).unwrap();
        assert!(first.is_some());

        assert_eq!(workflow.begin_approve(ctx(&principal), &form).unwrap(), None);
        assert_eq!(workflow.begin_submit(ctx(&principal), &form).unwrap(), None);
        assert!(!workflow.open_reject(ctx(&principal)).unwrap());
        assert!(workflow.reject_dialog().is_none());
        assert_eq!(workflow.in_flight().map(MutationRequest::kind), Some(MutationKind::SubmitEdit));

        let finished = workflow.finish(Ok(())).unwrap();
        assert_eq!(finished.kind(), MutationKind::SubmitEdit);
        assert!(workflow.actions_enabled(true));
    }

    #[test]
    fn test_failure_clears_busy_flag() {
        let principal = principal();
        let form = form();
        let mut workflow = ReviewWorkflow::new();
        workflow.begin_approve(ctx(&principal), &form).unwrap();
        let err = workflow
            .finish(Err(AppError::Database("down".into())))
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(!workflow.is_busy());
    }

    #[test]
    fn test_preconditions() {
        let principal = principal();
        let form = form();
        let mut workflow = ReviewWorkflow::new();

        let anonymous = ActionContext {
            principal: None,
            selected_id: Some("q1"),
        };
        assert!(matches!(
            workflow.begin_approve(anonymous, &form),
            Err(AppError::Precondition(_))
        ));

        let unselected = ActionContext {
            principal: Some(&principal),
            selected_id: None,
        };
        assert!(matches!(
            workflow.begin_submit(unselected, &form),
            Err(AppError::Precondition(_))
        ));
        assert!(!workflow.is_busy());
        assert!(!workflow.actions_enabled(false));
    }

    #[test]
    fn test_invalid_form_blocks_submission() {
        let principal = principal();
        let mut form = form();
        form.set_tags(Vec::new()).unwrap();
        let mut workflow = ReviewWorkflow::new();
        assert!(matches!(
            workflow.begin_submit(ctx(&principal), &form),
            Err(AppError::Validation(_))
        ));
        assert!(!workflow.is_busy());
    }

    #[test]
    fn test_reject_dialog_cancel_has_no_side_effects() {
        let principal = principal();
        let mut workflow = ReviewWorkflow::new();
        assert!(workflow.open_reject(ctx(&principal)).unwrap());
        assert_eq!(
            workflow.reject_dialog(),
            Some(&RejectDialog {
                question_id: "q1".into()
            })
        );
        assert!(workflow.cancel_reject());
        assert!(workflow.reject_dialog().is_none());
        assert!(!workflow.is_busy());
    }

    #[test]
    fn test_reject_requires_reason_and_closes_on_success() {
        let principal = principal();
        let form = form();
        let mut workflow = ReviewWorkflow::new();
        assert!(matches!(
            workflow.begin_reject(ctx(&principal), &form, "duplicate"),
            Err(AppError::Precondition(_))
        ));

        workflow.open_reject(ctx(&principal)).unwrap();
        assert!(matches!(
            workflow.begin_reject(ctx(&principal), &form, "   "),
            Err(AppError::Validation(_))
        ));

        let request = workflow
            .begin_reject(ctx(&principal), &form, " duplicate of #12 ")
            .unwrap()
            .unwrap();
        let MutationRequest::Transition(transition) = request else {
            panic!("expected a transition");
        };
        assert_eq!(transition.target, ReviewStatus::Reject);
        assert_eq!(transition.reason.as_deref(), Some("duplicate of #12"));
        assert!(!workflow.cancel_reject());

        workflow.finish(Ok(())).unwrap();
        assert!(workflow.reject_dialog().is_none());
    }

    #[test]
    fn test_failed_reject_keeps_dialog_open() {
        let principal = principal();
        let form = form();
        let mut workflow = ReviewWorkflow::new();
        workflow.open_reject(ctx(&principal)).unwrap();
        workflow
            .begin_reject(ctx(&principal), &form, "off topic")
            .unwrap();
        assert!(workflow.finish(Err(AppError::Internal("boom".into()))).is_err());
        assert!(workflow.reject_dialog().is_some());
    }

    #[test]
    fn test_reject_bound_to_selected_question() {
        let principal = principal();
        let form = form();
        let mut workflow = ReviewWorkflow::new();
        workflow.open_reject(ctx(&principal)).unwrap();

        let other = ActionContext {
            principal: Some(&principal),
            selected_id: Some("q2"),
        };
        assert!(matches!(
            workflow.begin_reject(other, &form, "spam"),
            Err(AppError::Precondition(_))
        ));
        assert!(workflow.reject_dialog().is_none());
        assert!(!workflow.is_busy());

        workflow.open_reject(ctx(&principal)).unwrap();
        let unselected = ActionContext {
            principal: Some(&principal),
            selected_id: None,
        };
        assert!(matches!(
            workflow.begin_reject(unselected, &form, "spam"),
            Err(AppError::Precondition(_))
        ));
        assert!(!workflow.is_busy());
    }

    #[test]
    fn test_dismiss_keeps_dialog_of_pending_reject() {
        let principal = principal();
        let form = form();
        let mut workflow = ReviewWorkflow::new();
        workflow.open_reject(ctx(&principal)).unwrap();
        workflow.dismiss_reject();
        assert!(workflow.reject_dialog().is_none());

        workflow.open_reject(ctx(&principal)).unwrap();
        workflow.begin_reject(ctx(&principal), &form, "spam").unwrap();
        workflow.dismiss_reject();
        assert!(workflow.reject_dialog().is_some());
    }

    #[test]
    fn test_out_of_range_score_blocks_approval() {
        let principal = principal();
        let mut form = form();
        form.set_score(9);
        let mut workflow = ReviewWorkflow::new();
        assert!(matches!(
            workflow.begin_approve(ctx(&principal), &form),
            Err(AppError::Validation(_))
        ));
    }
}
