//! Tag API endpoints.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::auth::CurrentPrincipal;
use crate::errors::AppError;
use crate::models::{CreateTagRequest, Tag, TagTaxonomy};
use crate::workbench::TagSource;
use crate::AppState;

/// GET /api/tags - Tag taxonomy: flat list plus grouping.
pub async fn get_taxonomy(State(state): State<AppState>) -> ApiResult<TagTaxonomy> {
    success(state.store.tag_taxonomy().await?)
}

/// POST /api/tags - Create a tag. Admin only.
pub async fn create_tag(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(request): Json<CreateTagRequest>,
) -> ApiResult<Tag> {
    if !principal.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators may create tags".to_string(),
        ));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Tag name is required".to_string()));
    }
    if request.group_name.trim().is_empty() {
        return Err(AppError::Validation("Tag group is required".to_string()));
    }

    let tag = state.store.repo().create_tag(&request).await?;
    tracing::info!(tag = %tag.name, group = %tag.group_name, "tag created");
    success(tag)
}
