//! Collaborator contracts the workbench depends on.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{
    CommentPage, Question, QuestionPatch, ReviewStatus, SearchPage, SearchQuery, TagTaxonomy,
    UserProfile,
};

/// A lifecycle transition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTransition {
    pub question_id: String,
    pub score: i64,
    pub target: ReviewStatus,
    /// Rejection reason; only sent with `ReviewStatus::Reject`.
    pub reason: Option<String>,
}

/// Persistence and query backend for questions.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, AppError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Question>, AppError>;

    async fn update(&self, id: &str, patch: &QuestionPatch) -> Result<(), AppError>;

    async fn transition(&self, transition: &ReviewTransition) -> Result<(), AppError>;
}

/// Resolves author ids to display profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;
}

/// Source of the tag taxonomy snapshot.
#[async_trait]
pub trait TagSource: Send + Sync {
    async fn tag_taxonomy(&self) -> Result<TagTaxonomy, AppError>;
}

/// Comments left on questions.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn list_comments(
        &self,
        question_id: &str,
        page_num: u32,
        page_size: u32,
    ) -> Result<CommentPage, AppError>;
}

/// A user-visible notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

/// Presents notices to the reviewer.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Success(message) => tracing::info!(%message, "review notice"),
            Notice::Warning(message) => tracing::warn!(%message, "review notice"),
            Notice::Error(message) => tracing::error!(%message, "review notice"),
        }
    }
}

/// Notifier that keeps every notice, for inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(notices) => notices.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        match self.notices.lock() {
            Ok(mut notices) => notices.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}
