//! Review-queue list and selected-record state.
//!
//! Fetches are split into `begin_*` / `finish_*` halves. `begin_*` returns a
//! ticket naming the query or selection that issued the request; `finish_*`
//! applies a response only while that ticket is still current, so a slow
//! earlier response never overwrites a newer one.

use crate::errors::AppError;
use crate::models::{Question, ReviewStatus, SearchPage, SearchQuery, UserProfile};

/// In-flight list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTicket {
    query: SearchQuery,
}

impl ListTicket {
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }
}

/// In-flight single-record request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectTicket {
    id: String,
    generation: u64,
}

impl SelectTicket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Result of resolving a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    Applied,
    /// A newer query replaced the one this response belongs to.
    Stale,
    Failed(AppError),
}

/// Result of resolving a single-record request.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    Loaded(Question),
    Stale,
    NotFound,
    Failed(AppError),
}

#[derive(Debug, Default)]
pub struct RecordLoader {
    list: Vec<Question>,
    total: u64,
    loading: bool,
    /// Query of the outstanding list request.
    in_flight: Option<SearchQuery>,
    /// Query whose response populated `list`.
    loaded: Option<SearchQuery>,
    selected_id: Option<String>,
    selected: Option<Question>,
    author: Option<UserProfile>,
    generation: u64,
    select_in_flight: bool,
}

impl RecordLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[Question] {
        &self.list
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Query of the list currently shown, if any.
    pub fn loaded_query(&self) -> Option<&SearchQuery> {
        self.loaded.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected(&self) -> Option<&Question> {
        self.selected.as_ref()
    }

    pub fn author(&self) -> Option<&UserProfile> {
        self.author.as_ref()
    }

    /// Whether a selection is waiting for its record to be fetched.
    pub fn selection_pending(&self) -> bool {
        self.selected_id.is_some() && self.selected.is_none() && !self.select_in_flight
    }

    /// Start a list request for `query`. Returns `None` when that query is
    /// already in flight or already shown.
    pub fn begin_list(&mut self, query: &SearchQuery) -> Option<ListTicket> {
        if self.in_flight.as_ref() == Some(query) {
            return None;
        }
        if self.in_flight.is_none() && self.loaded.as_ref() == Some(query) {
            return None;
        }
        self.in_flight = Some(query.clone());
        self.loading = true;
        Some(ListTicket {
            query: query.clone(),
        })
    }

    pub fn finish_list(
        &mut self,
        ticket: ListTicket,
        result: Result<SearchPage, AppError>,
    ) -> ListOutcome {
        if self.in_flight.as_ref() != Some(&ticket.query) {
            tracing::debug!(page = ticket.query.page_num, "discarding stale list response");
            return ListOutcome::Stale;
        }
        self.in_flight = None;
        self.loading = false;
        match result {
            Ok(page) => {
                self.list = page.items;
                self.total = page.total;
                self.loaded = Some(ticket.query);
                ListOutcome::Applied
            }
            Err(e) => ListOutcome::Failed(e),
        }
    }

    /// Record a selection without fetching it yet.
    pub fn defer_select(&mut self, id: &str) {
        self.generation += 1;
        self.selected_id = Some(id.to_string());
        self.selected = None;
        self.author = None;
        self.select_in_flight = false;
    }

    /// Select `id` and start fetching it. Clears the previous record.
    pub fn begin_select(&mut self, id: &str) -> SelectTicket {
        self.defer_select(id);
        self.select_in_flight = true;
        SelectTicket {
            id: id.to_string(),
            generation: self.generation,
        }
    }

    /// Start fetching a deferred selection.
    pub fn resume_select(&mut self) -> Option<SelectTicket> {
        if !self.selection_pending() {
            return None;
        }
        let id = self.selected_id.clone()?;
        Some(self.begin_select(&id))
    }

    fn is_current(&self, ticket: &SelectTicket) -> bool {
        ticket.generation == self.generation && self.selected_id.as_deref() == Some(&ticket.id)
    }

    pub fn finish_select(
        &mut self,
        ticket: &SelectTicket,
        result: Result<Option<Question>, AppError>,
    ) -> SelectOutcome {
        if !self.is_current(ticket) {
            tracing::debug!(id = %ticket.id, "discarding stale record response");
            return SelectOutcome::Stale;
        }
        self.select_in_flight = false;
        match result {
            Ok(Some(question)) => {
                self.selected = Some(question.clone());
                SelectOutcome::Loaded(question)
            }
            Ok(None) => {
                self.selected = None;
                SelectOutcome::NotFound
            }
            Err(e) => {
                self.selected = None;
                SelectOutcome::Failed(e)
            }
        }
    }

    /// Store the author profile for the selection `ticket` belongs to.
    pub fn finish_author(&mut self, ticket: &SelectTicket, profile: Option<UserProfile>) -> bool {
        if !self.is_current(ticket) || self.selected.is_none() {
            return false;
        }
        self.author = profile;
        true
    }

    /// Reflect a confirmed review transition in the loaded copies.
    pub fn apply_review(
        &mut self,
        question_id: &str,
        status: ReviewStatus,
        score: i64,
        message: Option<String>,
    ) {
        let targets = self
            .selected
            .iter_mut()
            .chain(self.list.iter_mut())
            .filter(|q| q.id == question_id);
        for question in targets {
            question.review_status = status;
            question.score = score;
            question.review_message = message.clone();
        }
    }
}
