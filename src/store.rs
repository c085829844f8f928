//! Local collaborator implementation backed by SQLite and the Tantivy index.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{
    Comment, CommentPage, Question, QuestionPatch, SearchPage, SearchQuery, TagTaxonomy,
    UserProfile,
};
use crate::search::SearchIndex;
use crate::workbench::{CommentSource, QuestionStore, ReviewTransition, TagSource, UserDirectory};

/// Keeps the database and the full-text index in step.
#[derive(Clone)]
pub struct LocalStore {
    repo: Arc<Repository>,
    index: Arc<SearchIndex>,
}

impl LocalStore {
    pub fn new(repo: Arc<Repository>, index: Arc<SearchIndex>) -> Self {
        Self { repo, index }
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Re-index every stored question.
    pub async fn rebuild_index(&self) -> Result<usize, AppError> {
        let questions = self.repo.list_questions().await?;
        self.index.rebuild(&questions).await?;
        Ok(questions.len())
    }

    async fn reindex(&self, question: &Question) {
        if let Err(e) = self.index.index_question(question).await {
            tracing::warn!("Failed to index question {}: {}", question.id, e);
        }
    }

    /// Store a validated submission.
    pub async fn create_question(
        &self,
        user_id: &str,
        patch: &QuestionPatch,
    ) -> Result<Question, AppError> {
        let question = self.repo.create_question(user_id, patch).await?;
        self.reindex(&question).await;
        tracing::info!(question_id = %question.id, "question submitted for review");
        Ok(question)
    }

    /// Apply an edit and return the stored record.
    pub async fn update_question(
        &self,
        id: &str,
        patch: &QuestionPatch,
    ) -> Result<Question, AppError> {
        let question = self.repo.update_question(id, patch).await?;
        self.reindex(&question).await;
        Ok(question)
    }

    /// Apply a review transition and return the stored record.
    pub async fn transition_question(
        &self,
        transition: &ReviewTransition,
    ) -> Result<Question, AppError> {
        let question = self.repo.transition_question(transition).await?;
        tracing::info!(
            question_id = %question.id,
            status = question.review_status.as_str(),
            score = question.score,
            "question reviewed"
        );
        Ok(question)
    }

    pub async fn create_comment(
        &self,
        question_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        let comment = self.repo.create_comment(question_id, user_id, content).await?;
        tracing::debug!(%question_id, comment_id = %comment.id, "comment added");
        Ok(comment)
    }
}

#[async_trait]
impl QuestionStore for LocalStore {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, AppError> {
        match query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(text) => {
                let ids = self.index.search_ids(text)?;
                self.repo.search_questions(query, Some(&ids)).await
            }
            None => self.repo.search_questions(query, None).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Question>, AppError> {
        self.repo.get_question(id).await
    }

    async fn update(&self, id: &str, patch: &QuestionPatch) -> Result<(), AppError> {
        self.update_question(id, patch).await.map(|_| ())
    }

    async fn transition(&self, transition: &ReviewTransition) -> Result<(), AppError> {
        self.transition_question(transition).await.map(|_| ())
    }
}

#[async_trait]
impl UserDirectory for LocalStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.repo.get_profile(user_id).await
    }
}

#[async_trait]
impl TagSource for LocalStore {
    async fn tag_taxonomy(&self) -> Result<TagTaxonomy, AppError> {
        let tags = self.repo.list_tags().await?;
        Ok(TagTaxonomy::from_tags(&tags))
    }
}

#[async_trait]
impl CommentSource for LocalStore {
    async fn list_comments(
        &self,
        question_id: &str,
        page_num: u32,
        page_size: u32,
    ) -> Result<CommentPage, AppError> {
        self.repo.list_comments(question_id, page_num, page_size).await
    }
}
