//! Duplicate lookup derived from the content field.

use crate::models::{QuestionType, ReviewStatus, SimilarityQuery};

/// Derive the probe for the text of a blurred content field.
///
/// Blank text yields `None`; the side list then shows its placeholder and no
/// request is made.
pub fn derive(text: &str, kind: Option<QuestionType>) -> Option<SimilarityQuery> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(SimilarityQuery {
        name: text.to_string(),
        review_status: ReviewStatus::Pass,
        kind,
    })
}

/// Latest probe, recomputed on every content blur.
#[derive(Debug, Clone, Default)]
pub struct SimilarityProbe {
    current: Option<SimilarityQuery>,
}

impl SimilarityProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&SimilarityQuery> {
        self.current.as_ref()
    }

    /// Replace the probe with one derived from `text`.
    pub fn on_content_blur(
        &mut self,
        text: &str,
        kind: Option<QuestionType>,
    ) -> Option<&SimilarityQuery> {
        self.current = derive(text, kind);
        self.current.as_ref()
    }

    /// Whether `query` is still the probe being shown.
    pub fn is_current(&self, query: &SimilarityQuery) -> bool {
        self.current.as_ref() == Some(query)
    }
}
