//! Rich-text document value.
//!
//! The authoring widget is external; the backend only ever sees its HTML
//! markup. What the review logic cares about is the plain-text projection.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Opaque rich-text document, stored as editor markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(String);

impl Document {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    /// The empty document (no markup at all).
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_markup(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Plain-text projection of the markup, trimmed.
    pub fn plain_text(&self) -> String {
        html_to_text(&self.0)
    }

    /// Whether the projection carries any visible text.
    pub fn has_text(&self) -> bool {
        !self.plain_text().is_empty()
    }

    /// Collapse documents whose projection is empty (e.g. `<p></p>`) to the
    /// empty document.
    pub fn normalized(self) -> Self {
        if self.has_text() {
            self
        } else {
            Self::empty()
        }
    }
}

impl From<&str> for Document {
    fn from(markup: &str) -> Self {
        Self::new(markup)
    }
}

fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)<(?:/p|/div|br\s*/?|/h[1-6]|/li|/tr)>").expect("static block pattern")
    })
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("static tag pattern"))
}

fn html_to_text(markup: &str) -> String {
    let text = block_pattern().replace_all(markup, "\n");
    let text = tag_pattern().replace_all(&text, "");
    decode_entities(&text).trim().to_string()
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
