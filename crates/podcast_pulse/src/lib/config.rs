pub const DEFAULT_AI_BASE_URL: &str = "https://api.siliconflow.cn/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

/// Completion provider settings, read from the environment.
#[derive(Debug, Clone, clap::Args)]
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible API
    #[arg(long = "ai-base-url", env = "OPENAI_BASE_URL", default_value = DEFAULT_AI_BASE_URL)]
    pub base_url: String,

    /// Model used for summaries
    #[arg(long = "ai-model", env = "AI_MODEL", default_value = DEFAULT_AI_MODEL)]
    pub model: String,

    /// API key; processing fails without one
    #[arg(long = "ai-api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AI_BASE_URL.into(),
            model: DEFAULT_AI_MODEL.into(),
            api_key: None,
        }
    }
}
