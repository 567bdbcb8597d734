pub mod scraper;

use std::{future::Future, sync::LazyLock};

use regex::Regex;

use crate::{error::Error, parser::HtmlDocument};

static PODCAST_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?xiaoyuzhoufm\.com/podcast/([a-zA-Z0-9]+)").unwrap()
});

/// Fetches public xiaoyuzhou pages.
pub trait PageFetcher {
    const BASE_URL: &'static str;

    fn podcast_url(podcast_id: &str) -> String {
        format!("{}/podcast/{podcast_id}", Self::BASE_URL)
    }

    fn episode_url(episode_id: &str) -> String {
        format!("{}/episode/{episode_id}", Self::BASE_URL)
    }

    /// Fails with [`Error::UpstreamFetch`] on transport errors and non-success statuses.
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<HtmlDocument, Error>> + Send;
}

/// Extracts the podcast id from a homepage link such as
/// `https://www.xiaoyuzhoufm.com/podcast/5e280fab418a84a0461fc579`.
pub fn parse_podcast_url(url: &str) -> Result<String, Error> {
    PODCAST_URL_RE
        .captures(url.trim())
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            Error::InvalidRequest(format!("Not a xiaoyuzhou podcast homepage link: {url}"))
        })
}
