//! Comment API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{require_visit, success, ApiResult};
use crate::auth::CurrentPrincipal;
use crate::config::MAX_PAGE_SIZE;
use crate::errors::AppError;
use crate::models::{Comment, CommentPage, CreateCommentRequest};
use crate::workbench::{CommentSource, QuestionStore};
use crate::AppState;

const MAX_COMMENT_CHARS: usize = 1_000;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentParams {
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
}

/// GET /api/questions/:id/comments - Comments on a question, newest first.
pub async fn list_comments(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    Query(params): Query<CommentParams>,
) -> ApiResult<CommentPage> {
    require_visit(&state, &principal).await?;
    if state.store.get_by_id(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Question {} not found", id)));
    }
    let page_num = params.page_num.unwrap_or(1).max(1);
    let page_size = params
        .page_size
        .unwrap_or(state.config.page_size)
        .clamp(1, MAX_PAGE_SIZE);
    success(state.store.list_comments(&id, page_num, page_size).await?)
}

/// POST /api/questions/:id/comments - Comment on a question.
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> ApiResult<Comment> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Comment is empty".to_string()));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "Comment exceeds {} characters",
            MAX_COMMENT_CHARS
        )));
    }
    success(state.store.create_comment(&id, &principal.id, content).await?)
}
