//! # Page Parser
//!
//! Low-level access to the two data sources a xiaoyuzhou page carries: the
//! `__NEXT_DATA__` JSON payload rendered by the site's Next.js frontend, and the
//! Open Graph `<meta>` tags used for link previews.

use std::{ops::Deref, sync::LazyLock};

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::Error;

static NEXT_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script[^>]*\bid="__NEXT_DATA__"[^>]*>(.+?)</script>"#).unwrap()
});

static OG_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?\bproperty\s*=\s*"og:([\w:]+)"[^>]*?\bcontent\s*=\s*"([^"]*)""#)
        .unwrap()
});

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

pub struct HtmlDocument(String);

impl Deref for HtmlDocument {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl HtmlDocument {
    pub fn new(doc: String) -> Self {
        HtmlDocument(doc)
    }

    /// Deserializes the first `__NEXT_DATA__` script payload in the page.
    pub fn next_data<T>(&self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let payload = NEXT_DATA_RE
            .captures(self)
            .and_then(|cap| cap.get(1))
            .ok_or(Error::ParseError(
                "Failed to find the __NEXT_DATA__ script tag in the page",
            ))?;

        serde_json::from_str(payload.as_str())
            .inspect_err(|e| tracing::warn!(error = %e, "__NEXT_DATA__ payload is not valid JSON"))
            .map_err(|_| Error::ParseError("Failed to parse the __NEXT_DATA__ payload"))
    }

    /// Content of the first non-empty `og:{property}` meta tag, entity-decoded.
    pub fn meta_property(&self, property: &str) -> Option<String> {
        OG_META_RE
            .captures_iter(self)
            .filter(|cap| cap[1].eq_ignore_ascii_case(property))
            .map(|cap| decode_entities(cap[2].trim()))
            .find(|content| !content.is_empty())
    }
}

impl From<String> for HtmlDocument {
    fn from(value: String) -> Self {
        HtmlDocument(value)
    }
}

/// Reduces an HTML fragment (shownotes are published as rich text) to plain text.
pub fn html_to_text(fragment: &str) -> String {
    let with_breaks = fragment
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p>", "</p>\n")
        .replace("</li>", "</li>\n");
    let stripped = HTML_TAG_RE.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);

    BLANK_LINES_RE
        .replace_all(decoded.trim(), "\n")
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}
