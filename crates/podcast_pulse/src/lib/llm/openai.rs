use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::AiConfig,
    llm::summarizer::{ProviderInfo, Summarizer, SummaryResponse},
};

/// Client for OpenAI-compatible chat completion APIs.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("AI API token not configured")]
    MissingApiKey,
}

impl From<OpenAIError> for crate::Error {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::MissingApiKey => {
                crate::Error::Configuration("AI API token not configured".into())
            }
            OpenAIError::Api { status, message } => crate::Error::UpstreamAi {
                status,
                body: message,
            },
            OpenAIError::Request(e) => crate::Error::UpstreamAi {
                status: e.status().map(|s| s.as_u16()).unwrap_or_default(),
                body: e.to_string(),
            },
        }
    }
}

impl OpenAIClient {
    pub const MAX_TOKENS: u32 = 2000;

    pub fn new(api_key: Option<String>) -> Self {
        let defaults = AiConfig::default();

        Self {
            client: Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: defaults.base_url,
            model: defaults.model,
        }
    }

    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(config.api_key.clone())
            .with_base_url(&config.base_url)
            .with_model(&config.model)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn completion_body(&self, user_content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": user_content
                }
            ],
            "stream": false,
            "max_tokens": Self::MAX_TOKENS
        })
    }

    #[tracing::instrument(skip_all, fields(base_url = %self.base_url, model = %self.model))]
    pub async fn send_completion_request(
        &self,
        user_content: &str,
    ) -> Result<CompletionResponse, OpenAIError> {
        // fail before touching the network
        let api_key = self.api_key.as_deref().ok_or(OpenAIError::MissingApiKey)?;

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&self.completion_body(user_content))
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OpenAIError::Api { status, message });
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

impl Summarizer for OpenAIClient {
    type Error = OpenAIError;

    fn provider(&self) -> ProviderInfo {
        ProviderInfo {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            key_configured: self.api_key.is_some(),
        }
    }

    async fn summarize(&self, prompt: &str) -> Result<SummaryResponse, Self::Error> {
        let response = self
            .send_completion_request(prompt)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        if let Some(reason) = response.choices.first().and_then(|c| c.finish_reason.as_deref()) {
            if reason == "length" {
                tracing::warn!(response_id = %response.id, "Completion was cut off at the token limit");
            }
        }

        // an empty reply is left for the reply parser to degrade
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(SummaryResponse { content })
    }
}
