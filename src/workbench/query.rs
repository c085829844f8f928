//! Review-queue filters to canonical search requests.

use serde::Deserialize;

use super::access::AccessScope;
use crate::errors::AppError;
use crate::models::{OrderKey, ReviewStatus, SearchQuery};

/// Values of the queue filter form, as submitted.
///
/// Every field replaces the previous filter value; an absent field clears it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterInput {
    #[serde(default)]
    pub name: Option<String>,
    /// Display form of the status select (`"0"`, `"1"`, `"2"`).
    #[serde(default)]
    pub review_status: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub or_tags: Option<Vec<String>>,
}

/// Holds the current review-queue query for one principal's scope.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    scope: AccessScope,
    current: SearchQuery,
}

impl QueryBuilder {
    /// Start from the default queue query. Fails closed when the scope may
    /// not visit the workbench.
    pub fn new(scope: AccessScope, page_size: u32) -> Result<Self, AppError> {
        if !scope.can_visit {
            return Err(AppError::Forbidden(
                "No permission to review questions".to_string(),
            ));
        }
        let current = SearchQuery {
            review_status: Some(ReviewStatus::Reviewing),
            or_tags: scope.clamp_or_tags(Some(scope.default_or_tags.clone())),
            order_key: OrderKey::CreateTime,
            ..SearchQuery::first_page(page_size)
        };
        Ok(Self { scope, current })
    }

    pub fn current(&self) -> &SearchQuery {
        &self.current
    }

    pub fn scope(&self) -> &AccessScope {
        &self.scope
    }

    /// Whether the `tags` (AND) control accepts input.
    pub fn and_tags_editable(&self) -> bool {
        self.scope.can_edit_and_tags()
    }

    /// Value shown by the `tags` control when it is disabled.
    pub fn and_tags_display(&self) -> &[String] {
        &self.scope.visible_tags
    }

    /// Merge submitted filter values over the current query and restart
    /// pagination. The current query is left untouched on error.
    pub fn apply_filters(&mut self, input: FilterInput) -> Result<&SearchQuery, AppError> {
        let review_status = match input.review_status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(ReviewStatus::parse_display(raw).ok_or_else(|| {
                AppError::Validation(format!("Unknown review status {:?}", raw))
            })?),
        };

        let tags = if self.scope.can_edit_and_tags() {
            non_empty(input.tags)
        } else {
            None
        };

        self.current = SearchQuery {
            name: non_blank(input.name),
            review_status,
            user_id: non_blank(input.user_id),
            tags,
            or_tags: self.scope.clamp_or_tags(input.or_tags),
            page_num: 1,
            ..self.current.clone()
        };
        Ok(&self.current)
    }

    /// Move to another page, keeping every filter.
    pub fn set_page(&mut self, page_num: u32) -> &SearchQuery {
        self.current.page_num = page_num.max(1);
        &self.current
    }

    /// Re-scope after the taxonomy changed. Filters and page are kept; the
    /// tag filters are clamped to what the new scope allows.
    pub fn rescope(&mut self, scope: AccessScope) -> Result<&SearchQuery, AppError> {
        if !scope.can_visit {
            return Err(AppError::Forbidden(
                "No permission to review questions".to_string(),
            ));
        }
        self.current.or_tags = scope.clamp_or_tags(self.current.or_tags.take());
        if !scope.can_edit_and_tags() {
            self.current.tags = None;
        }
        self.scope = scope;
        Ok(&self.current)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty(tags: Option<Vec<String>>) -> Option<Vec<String>> {
    tags.filter(|t| !t.is_empty())
}
