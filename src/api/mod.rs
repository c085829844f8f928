//! REST API module.
//!
//! Contains all API routes and handlers of the review backend.

mod comments;
mod questions;
mod tags;
mod users;

pub use comments::*;
pub use questions::*;
pub use tags::*;
pub use users::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::Principal;
use crate::workbench::{AccessScope, TagSource};
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Scope of `principal` against the current taxonomy.
async fn scope_for(state: &AppState, principal: &Principal) -> Result<AccessScope, AppError> {
    let taxonomy = state.store.tag_taxonomy().await?;
    Ok(AccessScope::for_principal(principal, &taxonomy))
}

/// Scope of `principal`, refused unless it may visit the workbench.
async fn require_visit(state: &AppState, principal: &Principal) -> Result<AccessScope, AppError> {
    let scope = scope_for(state, principal).await?;
    if !scope.can_visit {
        return Err(AppError::Forbidden(
            "No permission to review questions".to_string(),
        ));
    }
    Ok(scope)
}
