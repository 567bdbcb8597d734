use std::{ops::Deref, time::Duration};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

use crate::{error::Error, parser::HtmlDocument, xyz::PageFetcher};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client dressed up as a desktop browser; the site rejects obvious bots.
#[derive(Debug, Clone)]
pub struct Scraper(pub reqwest::Client);

impl Deref for Scraper {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Scraper {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Scraper(client))
    }
}

impl PageFetcher for Scraper {
    const BASE_URL: &'static str = "https://www.xiaoyuzhoufm.com";

    #[tracing::instrument(skip(self))]
    async fn fetch_page(&self, url: &str) -> Result<HtmlDocument, Error> {
        let upstream = |reason: String| Error::UpstreamFetch {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .get(url)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))
            .map_err(|e| upstream(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%status, "Page request was rejected");
            return Err(upstream(status.to_string()));
        }

        let html = resp.text().await.map_err(|e| upstream(e.to_string()))?;

        Ok(html.into())
    }
}
