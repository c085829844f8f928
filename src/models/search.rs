//! Search request and result models.

use serde::{Deserialize, Serialize};

use super::{Question, QuestionType, ReviewStatus};

/// Sort key for question searches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum OrderKey {
    /// Newest first.
    #[default]
    #[serde(rename = "_createTime")]
    CreateTime,
    /// Most recently updated first.
    #[serde(rename = "_updateTime")]
    UpdateTime,
    /// Highest priority first; unset priorities last.
    #[serde(rename = "priority")]
    Priority,
}

impl OrderKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKey::CreateTime => "_createTime",
            OrderKey::UpdateTime => "_updateTime",
            OrderKey::Priority => "priority",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "_createTime" => Some(OrderKey::CreateTime),
            "_updateTime" => Some(OrderKey::UpdateTime),
            "priority" => Some(OrderKey::Priority),
            _ => None,
        }
    }
}

/// Canonical question search request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Free text matched against name and content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_status: Option<ReviewStatus>,
    /// Author id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Every listed tag must be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// At least one listed tag must be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or_tags: Option<Vec<String>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<QuestionType>,
    pub page_num: u32,
    pub page_size: u32,
    #[serde(default)]
    pub order_key: OrderKey,
}

impl SearchQuery {
    /// Unfiltered first page.
    pub fn first_page(page_size: u32) -> Self {
        Self {
            name: None,
            review_status: None,
            user_id: None,
            tags: None,
            or_tags: None,
            kind: None,
            page_num: 1,
            page_size,
            order_key: OrderKey::default(),
        }
    }

    /// Zero-based row offset of the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_num.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub items: Vec<Question>,
    pub total: u64,
}

/// Read-only probe for likely duplicates among approved questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityQuery {
    pub name: String,
    pub review_status: ReviewStatus,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<QuestionType>,
}

impl SimilarityQuery {
    /// The search request issued for this probe. Not tag-scoped.
    pub fn to_search_query(&self, page_size: u32) -> SearchQuery {
        SearchQuery {
            name: Some(self.name.clone()),
            review_status: Some(self.review_status),
            kind: self.kind,
            ..SearchQuery::first_page(page_size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        let mut query = SearchQuery::first_page(10);
        assert_eq!(query.offset(), 0);
        query.page_num = 3;
        assert_eq!(query.offset(), 20);
        query.page_num = 0;
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_similarity_search_is_not_tag_scoped() {
        let probe = SimilarityQuery {
            name: "binary search".to_string(),
            review_status: ReviewStatus::Pass,
            kind: Some(QuestionType::SingleChoice),
        };
        let query = probe.to_search_query(10);
        assert_eq!(query.review_status, Some(ReviewStatus::Pass));
        assert_eq!(query.kind, Some(QuestionType::SingleChoice));
        assert!(query.tags.is_none());
        assert!(query.or_tags.is_none());
    }

    #[test]
    fn test_query_wire_names() {
        let mut query = SearchQuery::first_page(10);
        query.or_tags = Some(vec!["math".to_string()]);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["orTags"][0], "math");
        assert_eq!(value["orderKey"], "_createTime");
        assert_eq!(value["pageNum"], 1);
    }
}
