//! User and principal API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{scope_for, success, ApiResult};
use crate::auth::CurrentPrincipal;
use crate::errors::AppError;
use crate::models::{CreateUserRequest, Principal, UserProfile};
use crate::workbench::{AccessScope, UserDirectory};
use crate::AppState;

/// The acting principal with its review scope.
#[derive(Debug, Serialize)]
pub struct PrincipalResponse {
    pub principal: Principal,
    pub scope: AccessScope,
}

/// GET /api/principal - Principal named by `x-user-id`.
pub async fn get_principal(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<PrincipalResponse> {
    let scope = scope_for(&state, &principal).await?;
    success(PrincipalResponse { principal, scope })
}

/// POST /api/users - Register a user.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<Principal> {
    if request.display_name.trim().is_empty() {
        return Err(AppError::Validation("Display name is required".to_string()));
    }
    success(state.store.repo().create_user(&request).await?)
}

/// GET /api/users/:id/profile - Author display profile.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserProfile> {
    match state.store.get_profile(&id).await? {
        Some(profile) => success(profile),
        None => Err(AppError::NotFound(format!("User {} not found", id))),
    }
}
