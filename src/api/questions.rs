//! Question API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{require_visit, scope_for, success, ApiResult};
use crate::auth::CurrentPrincipal;
use crate::config::MAX_PAGE_SIZE;
use crate::errors::AppError;
use crate::models::{
    CreateQuestionRequest, OrderKey, Principal, Question, QuestionPatch, QuestionType,
    ReviewRequest, ReviewStatus, SearchPage, SearchQuery,
};
use crate::workbench::{
    AccessScope, EditForm, QuestionStore, ReviewTransition, UserDirectory, WorkbenchSettings,
};
use crate::AppState;

/// Query-string form of a search request. List values are comma separated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub name: Option<String>,
    pub review_status: Option<String>,
    pub user_id: Option<String>,
    pub tags: Option<String>,
    pub or_tags: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
    pub order_key: Option<String>,
}

impl SearchParams {
    /// Canonical query, with the configured page size as default.
    pub fn into_query(self, default_page_size: u32) -> Result<SearchQuery, AppError> {
        let review_status = match non_blank(self.review_status) {
            Some(raw) => Some(ReviewStatus::parse_display(&raw).ok_or_else(|| {
                AppError::Validation(format!("Unknown review status {:?}", raw))
            })?),
            None => None,
        };
        let kind = match non_blank(self.kind) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .ok()
                    .and_then(QuestionType::from_code)
                    .ok_or_else(|| AppError::Validation(format!("Unknown type {:?}", raw)))?,
            ),
            None => None,
        };
        let order_key = match non_blank(self.order_key) {
            Some(raw) => OrderKey::from_str(&raw)
                .ok_or_else(|| AppError::Validation(format!("Unknown order key {:?}", raw)))?,
            None => OrderKey::default(),
        };

        Ok(SearchQuery {
            name: non_blank(self.name),
            review_status,
            user_id: non_blank(self.user_id),
            tags: split_list(self.tags),
            or_tags: split_list(self.or_tags),
            kind,
            page_num: self.page_num.unwrap_or(1).max(1),
            page_size: self
                .page_size
                .unwrap_or(default_page_size)
                .clamp(1, MAX_PAGE_SIZE),
            order_key,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: Option<String>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Validate and normalize an incoming patch the way the edit form does.
fn validated_patch(state: &AppState, patch: &QuestionPatch) -> Result<QuestionPatch, AppError> {
    let settings = WorkbenchSettings::from(state.config.as_ref());
    let mut form = EditForm::new(settings.limits);
    form.load_patch(patch);
    Ok(form.to_patch()?)
}

/// GET /api/questions - Paginated search. Reviewers only.
pub async fn search_questions(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(params): Query<SearchParams>,
) -> ApiResult<SearchPage> {
    require_visit(&state, &principal).await?;
    let query = params.into_query(state.config.page_size)?;
    success(state.store.search(&query).await?)
}

/// POST /api/questions - Submit a question for review.
pub async fn create_question(
    State(state): State<AppState>,
    Json(request): Json<CreateQuestionRequest>,
) -> ApiResult<Question> {
    if state.store.get_profile(&request.user_id).await?.is_none() {
        return Err(AppError::Validation(format!(
            "Unknown author {}",
            request.user_id
        )));
    }
    let patch = validated_patch(&state, &request.to_patch())?;
    success(state.store.create_question(&request.user_id, &patch).await?)
}

/// GET /api/questions/:id - Get a single question. Reviewers only.
pub async fn get_question(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Question> {
    require_visit(&state, &principal).await?;
    match state.store.get_by_id(&id).await? {
        Some(question) => success(question),
        None => Err(AppError::NotFound(format!("Question {} not found", id))),
    }
}

/// Load a question the principal may moderate.
async fn moderated_question(
    state: &AppState,
    principal: &Principal,
    id: &str,
) -> Result<(Question, AccessScope), AppError> {
    let question = state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question {} not found", id)))?;
    let scope = scope_for(state, principal).await?;
    if !scope.can_moderate(&question.tags) {
        return Err(AppError::Forbidden(format!(
            "No permission to moderate question {}",
            id
        )));
    }
    Ok((question, scope))
}

/// PUT /api/questions/:id - Apply an edit patch.
pub async fn update_question(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    Json(patch): Json<QuestionPatch>,
) -> ApiResult<Question> {
    let (_, scope) = moderated_question(&state, &principal, &id).await?;
    let patch = validated_patch(&state, &patch)?;
    if !scope.can_moderate(&patch.tags) {
        return Err(AppError::Forbidden(
            "Edited tags leave your review scope".to_string(),
        ));
    }

    let question = state.store.update_question(&id, &patch).await?;
    tracing::info!(question_id = %id, reviewer = %principal.id, "question edited");
    success(question)
}

/// POST /api/questions/:id/review - Approve or reject.
pub async fn review_question(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> ApiResult<Question> {
    moderated_question(&state, &principal, &id).await?;

    let limits = WorkbenchSettings::from(state.config.as_ref()).limits;
    if !(limits.min_score..=limits.max_score).contains(&request.score) {
        return Err(AppError::Validation(format!(
            "Score must be between {} and {}",
            limits.min_score, limits.max_score
        )));
    }

    let transition = ReviewTransition {
        question_id: id,
        score: request.score,
        target: request.review_status,
        reason: request.review_message,
    };
    success(state.store.transition_question(&transition).await?)
}
