//! Question Review Workbench
//!
//! The moderation core (`workbench`) plus a local REST backend with SQLite
//! persistence and Tantivy full-text search that serves as its collaborator.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod search;
pub mod store;
pub mod workbench;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use store::LocalStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: LocalStore,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Principal and users
        .route("/principal", get(api::get_principal))
        .route("/users", post(api::create_user))
        .route("/users/{id}/profile", get(api::get_profile))
        // Tags
        .route("/tags", get(api::get_taxonomy).post(api::create_tag))
        // Questions
        .route(
            "/questions",
            get(api::search_questions).post(api::create_question),
        )
        .route(
            "/questions/{id}",
            get(api::get_question).put(api::update_question),
        )
        .route("/questions/{id}/review", post(api::review_question))
        .route(
            "/questions/{id}/comments",
            get(api::list_comments).post(api::create_comment),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
