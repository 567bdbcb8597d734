use std::{fmt::Debug, future::Future};

use serde::Serialize;

pub trait Summarizer {
    const CONTEXT_WINDOW_LIMIT: usize = 128_000 - 18_000;

    type Error: Into<crate::Error> + Debug;

    /// Non-sensitive description of the configured provider, safe to echo to callers.
    fn provider(&self) -> ProviderInfo;

    fn summarize(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct SummaryResponse {
    /// Raw assistant reply; not guaranteed to be JSON.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub base_url: String,
    pub model: String,
    pub key_configured: bool,
}
