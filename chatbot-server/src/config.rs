use tracing::{info, warn};

/// Sentinel value shipped in .env templates; treated the same as no key at all.
pub const PLACEHOLDER_KEY: &str = ">>> INSERT_API_KEY_HERE <<<";

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const SYSTEM_PROMPT: &str = "\
You are a helpful, polite, and clear AI chatbot assistant.
Your goals are:
- Answer questions accurately and maintain context.
- Handle step-by-step explanations.
- Avoid giving wrong or unsafe information.
- Provide code examples when asked.
- Format content neatly using Markdown.
- If the topic is unknown, respond safely and admit lack of knowledge.
- Keep answers simple and clean.
- Avoid a robotic tone.";

/// Process-wide model settings, read from the environment once at startup
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl ModelConfig {
    pub fn from_env() -> Self {
        let api_key = std::env::var("API_KEY").unwrap_or_else(|_| PLACEHOLDER_KEY.to_string());
        let model_name = std::env::var("MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let config = Self {
            api_key,
            model_name,
            temperature: 0.7,
            max_tokens: 1000,
            system_prompt: SYSTEM_PROMPT.to_string(),
        };

        if config.is_configured() {
            info!("API key loaded, using model: {}", config.model_name);
        } else {
            warn!("API_KEY not set or still the placeholder. Please set it in your .env file");
        }

        config
    }

    /// A missing, empty, or placeholder key means the server runs in mock
    /// mode instead of calling the upstream provider.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && self.api_key != PLACEHOLDER_KEY
    }
}

#[cfg(test)]
pub fn test_config(api_key: &str) -> ModelConfig {
    ModelConfig {
        api_key: api_key.to_string(),
        model_name: DEFAULT_MODEL.to_string(),
        temperature: 0.7,
        max_tokens: 1000,
        system_prompt: SYSTEM_PROMPT.to_string(),
    }
}
