use std::sync::{Arc, Mutex};

use podcast_pulse::{Error, ProviderInfo, Summarizer, SummaryResponse};

#[derive(Clone)]
pub struct MockSummarizer {
    pub reply: String,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<(u16, String)>,
}

impl MockSummarizer {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    /// Replies with a well-formed summary object wrapped in some chatter.
    pub fn structured() -> Self {
        Self::new(
            r#"好的，以下是摘要：
```json
{
  "summary": "本期节目讨论了慢生活与注意力管理。",
  "key_points": ["放慢节奏", "减少信息摄入", "重建专注"],
  "keywords": ["慢生活", "注意力"],
  "timestamps": [
    {"time": 0, "topic": "开场介绍", "summary": "主持人介绍本期主题"},
    {"time": 180, "topic": "信息过载", "summary": "为什么我们总是很忙"},
    {"time": 900, "topic": "总结与结语", "summary": "给听众的建议"}
  ]
}
```"#,
        )
    }

    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            reply: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some((status, body.to_string())),
        }
    }
}

impl Summarizer for MockSummarizer {
    type Error = Error;

    fn provider(&self) -> ProviderInfo {
        ProviderInfo {
            base_url: "https://mock.ai/v1".to_string(),
            model: "mock-gpt".to_string(),
            key_configured: true,
        }
    }

    async fn summarize(&self, prompt: &str) -> Result<SummaryResponse, Self::Error> {
        self.calls.lock().unwrap().push(prompt.to_string());
        if let Some((status, ref body)) = self.fail_with {
            return Err(Error::UpstreamAi {
                status,
                body: body.clone(),
            });
        }
        Ok(SummaryResponse {
            content: self.reply.clone(),
        })
    }
}
