//! Moderation workbench core.
//!
//! `Workbench` wires the scope, queue query, record loader, edit form, review
//! workflow and similarity probe to the collaborators. It is a single logical
//! owner: every operation takes `&mut self` and awaits its collaborator calls
//! in turn.

pub mod access;
pub mod backend;
pub mod form;
pub mod loader;
pub mod query;
pub mod similarity;
pub mod workflow;


use std::sync::Arc;

use crate::config::{Config, DEFAULT_PAGE_SIZE};
use crate::errors::AppError;
use crate::models::{
    Comment, Principal, Question, ReviewStatus, SearchQuery, TagTaxonomy, UserProfile,
};

pub use access::AccessScope;
pub use backend::{
    CommentSource, Notice, Notifier, QuestionStore, RecordingNotifier, ReviewTransition,
    TagSource, TracingNotifier, UserDirectory,
};
pub use form::{EditForm, FormLimits};
pub use loader::{ListOutcome, RecordLoader, SelectOutcome, SelectTicket};
pub use query::{FilterInput, QueryBuilder};
pub use similarity::SimilarityProbe;
pub use workflow::{ActionContext, MutationRequest, ReviewWorkflow};

/// Tunables of the workbench.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkbenchSettings {
    pub page_size: u32,
    pub limits: FormLimits,
}

impl Default for WorkbenchSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            limits: FormLimits::default(),
        }
    }
}

impl From<&Config> for WorkbenchSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            ..Self::default()
        }
    }
}

/// Pagination footer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current: u32,
    pub page_size: u32,
    pub total: u64,
}

impl PageInfo {
    pub fn total_pages(&self) -> u64 {
        let size = u64::from(self.page_size.max(1));
        self.total.div_ceil(size).max(1)
    }

    pub fn total_label(&self) -> String {
        format!("Total {}", self.total)
    }
}

/// One row of the review queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: String,
    /// Name, or the start of the content when the name is blank.
    pub title: String,
    pub review_status: ReviewStatus,
    pub create_time: String,
}

impl From<&Question> for QueueEntry {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            title: question.title(),
            review_status: question.review_status,
            create_time: question.create_time.clone(),
        }
    }
}

/// Comments shown for the selected question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDrawer {
    pub question_id: String,
    pub comments: Vec<Comment>,
    pub total: u64,
}

pub struct Workbench<B> {
    backend: Arc<B>,
    notifier: Arc<dyn Notifier>,
    settings: WorkbenchSettings,
    taxonomy: TagTaxonomy,
    principal: Option<Principal>,
    scope: AccessScope,
    query: Option<QueryBuilder>,
    loader: RecordLoader,
    form: EditForm,
    workflow: ReviewWorkflow,
    probe: SimilarityProbe,
    similar: Vec<Question>,
    comments: Option<CommentDrawer>,
}

impl<B> Workbench<B>
where
    B: QuestionStore + UserDirectory + TagSource + CommentSource,
{
    pub fn new(backend: Arc<B>, notifier: Arc<dyn Notifier>, settings: WorkbenchSettings) -> Self {
        Self {
            backend,
            notifier,
            settings,
            taxonomy: TagTaxonomy::default(),
            principal: None,
            scope: AccessScope::denied(),
            query: None,
            loader: RecordLoader::new(),
            form: EditForm::new(settings.limits),
            workflow: ReviewWorkflow::new(),
            probe: SimilarityProbe::new(),
            similar: Vec::new(),
            comments: None,
        }
    }

    pub fn settings(&self) -> &WorkbenchSettings {
        &self.settings
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn scope(&self) -> &AccessScope {
        &self.scope
    }

    /// `false` means the denial view is shown.
    pub fn can_visit(&self) -> bool {
        self.scope.can_visit
    }

    pub fn taxonomy(&self) -> &TagTaxonomy {
        &self.taxonomy
    }

    /// Current queue query, if the principal may visit.
    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref().map(QueryBuilder::current)
    }

    pub fn query_builder(&self) -> Option<&QueryBuilder> {
        self.query.as_ref()
    }

    pub fn loader(&self) -> &RecordLoader {
        &self.loader
    }

    pub fn list(&self) -> &[Question] {
        self.loader.list()
    }

    /// Queue rows in list order.
    pub fn queue_entries(&self) -> Vec<QueueEntry> {
        self.loader.list().iter().map(QueueEntry::from).collect()
    }

    pub fn selected(&self) -> Option<&Question> {
        self.loader.selected()
    }

    pub fn author(&self) -> Option<&UserProfile> {
        self.loader.author()
    }

    pub fn form(&self) -> &EditForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EditForm {
        &mut self.form
    }

    pub fn workflow(&self) -> &ReviewWorkflow {
        &self.workflow
    }

    pub fn probe(&self) -> &SimilarityProbe {
        &self.probe
    }

    /// Side list of likely duplicates.
    pub fn similar(&self) -> &[Question] {
        &self.similar
    }

    pub fn comments(&self) -> Option<&CommentDrawer> {
        self.comments.as_ref()
    }

    pub fn actions_enabled(&self) -> bool {
        self.workflow.actions_enabled(self.loader.selected().is_some())
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo {
            current: self.query().map(|q| q.page_num).unwrap_or(1),
            page_size: self.settings.page_size,
            total: self.loader.total(),
        }
    }

    fn surface(&self, error: AppError) -> AppError {
        match &error {
            // Rendered inline next to the fields.
            AppError::Validation(_) => {}
            AppError::Precondition(message) => {
                self.notifier.notify(Notice::Warning(message.clone()))
            }
            other => self.notifier.notify(Notice::Error(other.message())),
        }
        error
    }

    /// Replace the taxonomy snapshot and re-scope the queue. An established
    /// queue keeps its filters and page.
    pub async fn set_taxonomy(&mut self, taxonomy: TagTaxonomy) -> Result<(), AppError> {
        self.taxonomy = taxonomy;
        let Some(principal) = self.principal.as_ref() else {
            return Ok(());
        };
        let Some(builder) = self.query.as_mut() else {
            let principal = principal.clone();
            return self.establish_principal(principal).await;
        };

        let scope = AccessScope::for_principal(principal, &self.taxonomy);
        let rescoped = builder.rescope(scope.clone()).map(|_| ());
        self.scope = scope;
        if let Err(e) = rescoped {
            self.query = None;
            return Err(e);
        }
        self.refresh_list().await
    }

    /// Fetch the taxonomy from the tag source.
    pub async fn refresh_taxonomy(&mut self) -> Result<(), AppError> {
        let taxonomy = match self.backend.tag_taxonomy().await {
            Ok(taxonomy) => taxonomy,
            Err(e) => return Err(self.surface(e)),
        };
        self.set_taxonomy(taxonomy).await
    }

    /// Bind the acting principal and load the default queue. A principal
    /// without visit rights gets `Forbidden` and nothing is fetched.
    pub async fn establish_principal(&mut self, principal: Principal) -> Result<(), AppError> {
        self.scope = AccessScope::for_principal(&principal, &self.taxonomy);
        self.principal = Some(principal);

        match QueryBuilder::new(self.scope.clone(), self.settings.page_size) {
            Ok(builder) => self.query = Some(builder),
            Err(e) => {
                tracing::info!("principal may not visit the review workbench");
                self.query = None;
                return Err(e);
            }
        }

        self.refresh_list().await?;

        if let Some(ticket) = self.loader.resume_select() {
            self.load_selection(ticket).await?;
        }
        Ok(())
    }

    /// Fetch the list for the current query unless it is already shown.
    pub async fn refresh_list(&mut self) -> Result<(), AppError> {
        let Some(builder) = self.query.as_ref() else {
            return Ok(());
        };
        let query = builder.current().clone();
        let Some(ticket) = self.loader.begin_list(&query) else {
            return Ok(());
        };
        let result = self.backend.search(&query).await;
        match self.loader.finish_list(ticket, result) {
            ListOutcome::Applied | ListOutcome::Stale => Ok(()),
            ListOutcome::Failed(e) => Err(self.surface(e)),
        }
    }

    fn builder_mut(&mut self) -> Result<&mut QueryBuilder, AppError> {
        self.query
            .as_mut()
            .ok_or_else(|| AppError::Forbidden("No permission to review questions".to_string()))
    }

    /// Submit the filter form.
    pub async fn apply_filters(&mut self, input: FilterInput) -> Result<(), AppError> {
        self.builder_mut()?.apply_filters(input)?;
        self.refresh_list().await
    }

    /// Move to another page of the queue.
    pub async fn change_page(&mut self, page_num: u32) -> Result<(), AppError> {
        self.builder_mut()?.set_page(page_num);
        self.refresh_list().await
    }

    /// Select a queue entry. Deferred until a principal is known.
    pub async fn select(&mut self, id: &str) -> Result<(), AppError> {
        self.workflow.dismiss_reject();
        self.comments = None;
        self.form.reset();
        self.probe = SimilarityProbe::new();
        self.similar.clear();

        if self.principal.is_none() {
            self.loader.defer_select(id);
            return Ok(());
        }
        let ticket = self.loader.begin_select(id);
        self.load_selection(ticket).await
    }

    async fn load_selection(&mut self, ticket: SelectTicket) -> Result<(), AppError> {
        let result = self.backend.get_by_id(ticket.id()).await;
        let question = match self.loader.finish_select(&ticket, result) {
            SelectOutcome::Loaded(question) => question,
            SelectOutcome::Stale => return Ok(()),
            SelectOutcome::NotFound => {
                let error = AppError::NotFound(format!("Question {} not found", ticket.id()));
                return Err(self.surface(error));
            }
            SelectOutcome::Failed(e) => return Err(self.surface(e)),
        };
        self.form.load(&question);

        let profile = match self.backend.get_profile(&question.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(user_id = %question.user_id, error = %e, "author profile unavailable");
                None
            }
        };
        self.loader.finish_author(&ticket, profile);
        Ok(())
    }

    /// Content field lost focus: refresh the duplicate probe.
    pub async fn blur_detail(&mut self) -> Result<(), AppError> {
        let text = self.form.detail_text();
        let Some(probe) = self.probe.on_content_blur(&text, self.form.kind()).cloned() else {
            self.similar.clear();
            return Ok(());
        };
        let query = probe.to_search_query(self.settings.page_size);
        let result = self.backend.search(&query).await;
        if !self.probe.is_current(&probe) {
            return Ok(());
        }
        match result {
            Ok(page) => {
                self.similar = page.items;
                Ok(())
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    /// Open the comment drawer for the selected question.
    pub async fn open_comments(&mut self) -> Result<(), AppError> {
        let Some(question_id) = self.loader.selected().map(|q| q.id.clone()) else {
            let error = AppError::Precondition("Select a question first".to_string());
            return Err(self.surface(error));
        };
        let result = self
            .backend
            .list_comments(&question_id, 1, self.settings.page_size)
            .await;
        if self.loader.selected().map(|q| q.id.as_str()) != Some(question_id.as_str()) {
            return Ok(());
        }
        match result {
            Ok(page) => {
                self.comments = Some(CommentDrawer {
                    question_id,
                    comments: page.items,
                    total: page.total,
                });
                Ok(())
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    pub fn close_comments(&mut self) {
        self.comments = None;
    }

    /// Send the edited fields without touching the review status.
    pub async fn submit_edit(&mut self) -> Result<(), AppError> {
        let ctx = ActionContext {
            principal: self.principal.as_ref(),
            selected_id: self.loader.selected().map(|q| q.id.as_str()),
        };
        let request = match self.workflow.begin_submit(ctx, &self.form) {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e) => return Err(self.surface(e)),
        };
        self.execute(request).await
    }

    /// Approve the selected question with the score as currently edited.
    pub async fn approve(&mut self) -> Result<(), AppError> {
        let ctx = ActionContext {
            principal: self.principal.as_ref(),
            selected_id: self.loader.selected().map(|q| q.id.as_str()),
        };
        let request = match self.workflow.begin_approve(ctx, &self.form) {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e) => return Err(self.surface(e)),
        };
        self.execute(request).await
    }

    /// Open the rejection reason step.
    pub fn open_reject(&mut self) -> Result<bool, AppError> {
        let ctx = ActionContext {
            principal: self.principal.as_ref(),
            selected_id: self.loader.selected().map(|q| q.id.as_str()),
        };
        match self.workflow.open_reject(ctx) {
            Ok(opened) => Ok(opened),
            Err(e) => Err(self.surface(e)),
        }
    }

    pub fn cancel_reject(&mut self) -> bool {
        self.workflow.cancel_reject()
    }

    /// Reject the question bound to the open dialog.
    pub async fn confirm_reject(&mut self, reason: &str) -> Result<(), AppError> {
        let ctx = ActionContext {
            principal: self.principal.as_ref(),
            selected_id: self.loader.selected().map(|q| q.id.as_str()),
        };
        let request = match self.workflow.begin_reject(ctx, &self.form, reason) {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e) => return Err(self.surface(e)),
        };
        self.execute(request).await
    }

    async fn execute(&mut self, request: MutationRequest) -> Result<(), AppError> {
        let result = match &request {
            MutationRequest::Update { question_id, patch } => {
                self.backend.update(question_id, patch).await
            }
            MutationRequest::Transition(transition) => self.backend.transition(transition).await,
        };
        let request = match self.workflow.finish(result) {
            Ok(request) => request,
            Err(e) => return Err(self.surface(e)),
        };

        let message = match request {
            MutationRequest::Update { question_id, .. } => {
                tracing::info!(%question_id, "question updated");
                "Question updated".to_string()
            }
            MutationRequest::Transition(transition) => {
                tracing::info!(
                    question_id = %transition.question_id,
                    status = transition.target.as_str(),
                    score = transition.score,
                    "review transition applied"
                );
                self.loader.apply_review(
                    &transition.question_id,
                    transition.target,
                    transition.score,
                    transition.reason,
                );
                match transition.target {
                    ReviewStatus::Reject => "Question rejected".to_string(),
                    _ => "Question approved".to_string(),
                }
            }
        };
        self.notifier.notify(Notice::Success(message));
        Ok(())
    }
}
