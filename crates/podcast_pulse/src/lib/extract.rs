//! Extraction strategies over a scraped page.
//!
//! Each [`PageExtractor`] answers three questions about a page (podcast metadata,
//! episode listing, shownotes) and may decline any of them by returning `None`.
//! [`ExtractionChain`] asks its strategies in order and keeps the first answer per
//! question, so a page whose embedded JSON lacks the podcast object still gets its
//! metadata from the meta tags while keeping the JSON episode list.

use chrono::Utc;
use serde_json::Value;

use crate::{
    parser::{html_to_text, HtmlDocument},
    types::{synthesized_name, EpisodeInfo, PodcastInfo, RawEpisode, RawPodcast},
};

pub const MAX_EPISODES: usize = 3;

pub trait PageExtractor {
    fn name(&self) -> &'static str;

    fn extract_podcast(&self, doc: &HtmlDocument, podcast_id: &str) -> Option<PodcastInfo>;

    /// Raw episode listing in page order, before normalization and capping.
    fn extract_episodes(&self, doc: &HtmlDocument) -> Option<Vec<RawEpisode>>;

    fn extract_shownotes(&self, doc: &HtmlDocument) -> Option<String>;
}

/// Reads the `__NEXT_DATA__` payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredJsonExtractor;

impl StructuredJsonExtractor {
    fn page_props(doc: &HtmlDocument) -> Option<Value> {
        doc.next_data::<Value>()
            .inspect_err(|e| tracing::debug!(error = %e, "No usable structured payload"))
            .ok()
            .and_then(|mut json| json.pointer_mut("/props/pageProps").map(Value::take))
            .filter(Value::is_object)
    }
}

impl PageExtractor for StructuredJsonExtractor {
    fn name(&self) -> &'static str {
        "structured-json"
    }

    fn extract_podcast(&self, doc: &HtmlDocument, podcast_id: &str) -> Option<PodcastInfo> {
        let page_props = Self::page_props(doc)?;
        let podcast = page_props.get("podcast").filter(|p| p.is_object())?;

        serde_json::from_value::<RawPodcast>(podcast.clone())
            .inspect_err(|e| tracing::warn!(error = %e, "Unexpected podcast object shape"))
            .ok()
            .map(|raw| raw.into_info(podcast_id))
    }

    fn extract_episodes(&self, doc: &HtmlDocument) -> Option<Vec<RawEpisode>> {
        let page_props = Self::page_props(doc)?;

        // the listing has lived in both places across site releases
        let listing = page_props["episodes"]
            .as_array()
            .or_else(|| page_props["podcast"]["episodes"].as_array())?;

        let episodes = listing
            .iter()
            .filter_map(|item| {
                serde_json::from_value::<RawEpisode>(item.clone())
                    .inspect_err(|e| tracing::warn!(error = %e, "Skipping malformed episode entry"))
                    .ok()
            })
            .collect();

        Some(episodes)
    }

    fn extract_shownotes(&self, doc: &HtmlDocument) -> Option<String> {
        let page_props = Self::page_props(doc)?;
        let episode = &page_props["episode"];

        let text = [&episode["shownotes"], &episode["description"]]
            .into_iter()
            .filter_map(Value::as_str)
            .map(html_to_text)
            .find(|text| !text.is_empty());
        text
    }
}

/// Falls back to Open Graph tags. Always produces podcast metadata, never episodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaTagExtractor;

impl PageExtractor for MetaTagExtractor {
    fn name(&self) -> &'static str {
        "meta-tags"
    }

    fn extract_podcast(&self, doc: &HtmlDocument, podcast_id: &str) -> Option<PodcastInfo> {
        Some(PodcastInfo {
            id: podcast_id.to_string(),
            name: doc
                .meta_property("title")
                .unwrap_or_else(|| synthesized_name(podcast_id)),
            description: doc.meta_property("description").unwrap_or_default(),
            avatar: doc.meta_property("image").unwrap_or_default(),
        })
    }

    fn extract_episodes(&self, _doc: &HtmlDocument) -> Option<Vec<RawEpisode>> {
        None
    }

    fn extract_shownotes(&self, doc: &HtmlDocument) -> Option<String> {
        doc.meta_property("description")
    }
}

/// Everything ingestion needs from a podcast homepage.
#[derive(Debug, Clone, PartialEq)]
pub struct PodcastPage {
    pub podcast: PodcastInfo,
    pub episodes: Vec<EpisodeInfo>,
}

pub struct ExtractionChain {
    extractors: Vec<Box<dyn PageExtractor + Send + Sync>>,
}

impl Default for ExtractionChain {
    fn default() -> Self {
        Self {
            extractors: vec![Box::new(StructuredJsonExtractor), Box::new(MetaTagExtractor)],
        }
    }
}

impl std::fmt::Debug for ExtractionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionChain")
            .field(
                "extractors",
                &self.extractors.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ExtractionChain {
    fn first<T>(&self, f: impl Fn(&dyn PageExtractor) -> Option<T>) -> Option<(T, &'static str)> {
        self.extractors
            .iter()
            .find_map(|e| f(e.as_ref()).map(|value| (value, e.name())))
    }

    /// Never fails: a page with nothing recognizable still yields a synthesized podcast.
    #[tracing::instrument(skip(self, doc))]
    pub fn podcast_page(&self, doc: &HtmlDocument, podcast_id: &str) -> PodcastPage {
        let podcast = match self.first(|e| e.extract_podcast(doc, podcast_id)) {
            Some((podcast, source)) => {
                tracing::debug!(source, "Extracted podcast metadata");
                podcast
            }
            None => PodcastInfo {
                id: podcast_id.to_string(),
                name: synthesized_name(podcast_id),
                ..Default::default()
            },
        };

        let now = Utc::now();
        // source order is newest first; it is trusted, not re-sorted
        let episodes = self
            .first(|e| e.extract_episodes(doc))
            .map(|(listing, _)| listing)
            .unwrap_or_default()
            .into_iter()
            .take(MAX_EPISODES)
            .filter_map(|raw| raw.normalize(&podcast.avatar, now))
            .collect();

        PodcastPage { podcast, episodes }
    }

    pub fn shownotes(&self, doc: &HtmlDocument) -> Option<String> {
        self.first(|e| e.extract_shownotes(doc))
            .map(|(text, source)| {
                tracing::debug!(source, chars = text.chars().count(), "Extracted shownotes");
                text
            })
    }
}
