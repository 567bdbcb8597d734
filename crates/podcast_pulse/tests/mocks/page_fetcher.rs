use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use podcast_pulse::{parser::HtmlDocument, xyz::PageFetcher, Error};

/// Serves canned pages by URL; anything else answers 404.
#[derive(Clone, Default)]
pub struct MockPageFetcher {
    pub pages: HashMap<String, String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockPageFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_podcast(self, podcast_id: &str, html: &str) -> Self {
        self.with_page(&Self::podcast_url(podcast_id), html)
    }

    pub fn with_episode(self, episode_id: &str, html: &str) -> Self {
        self.with_page(&Self::episode_url(episode_id), html)
    }

    pub fn fixture_podcast() -> &'static str {
        include_str!("../fixtures/podcast.html")
    }

    pub fn fixture_podcast_meta_only() -> &'static str {
        include_str!("../fixtures/podcast_meta_only.html")
    }

    pub fn fixture_episode() -> &'static str {
        include_str!("../fixtures/episode.html")
    }

    pub fn fixture_episode_short() -> &'static str {
        include_str!("../fixtures/episode_short.html")
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl PageFetcher for MockPageFetcher {
    const BASE_URL: &'static str = "https://xyz.mock";

    async fn fetch_page(&self, url: &str) -> Result<HtmlDocument, Error> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(html) => Ok(HtmlDocument::new(html.clone())),
            None => Err(Error::UpstreamFetch {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            }),
        }
    }
}
