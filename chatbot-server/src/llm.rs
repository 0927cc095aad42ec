use crate::config::ModelConfig;
use crate::conversation::split_conversation;
use crate::error::{classify_upstream, ApiError};
use chatbot_shared::{ChatMessage, ChatResponse, MessageRole};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const UPSTREAM_TIMEOUT_SECS: u64 = 60;

const MOCK_RESPONSE: &str = "I am ready to help! Please configure your API key \
                             in the .env file to get real AI responses.";

/// Chat-completion service, selected once at startup: either a real Gemini
/// client or the mock fallback for servers without a configured key. Both
/// variants answer the same `chat` call, so handlers never branch on
/// configuration state.
pub enum LlmService {
    Configured(GeminiClient),
    Unconfigured { model: String },
}

impl LlmService {
    pub fn new(config: ModelConfig) -> Self {
        if config.is_configured() {
            info!("Initializing Gemini service with model: {}", config.model_name);
            LlmService::Configured(GeminiClient::new(config))
        } else {
            warn!("Running in mock mode: all chat responses will be canned");
            LlmService::Unconfigured {
                model: config.model_name,
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, LlmService::Configured(_))
    }

    pub fn model(&self) -> &str {
        match self {
            LlmService::Configured(client) => &client.config.model_name,
            LlmService::Unconfigured { model } => model,
        }
    }

    /// Runs one chat completion. The mock variant answers before any
    /// validation, mirroring a server that short-circuits when unconfigured.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        model_override: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        match self {
            LlmService::Unconfigured { model } => Ok(ChatResponse {
                response: MOCK_RESPONSE.to_string(),
                model: model.clone(),
            }),
            LlmService::Configured(client) => {
                let (history, current_turn) = split_conversation(messages)?;
                client.chat(&history, &current_turn, model_override).await
            }
        }
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl GeminiClient {
    fn new(config: ModelConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest Client");
        Self { http, config }
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        current_turn: &str,
        model_override: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        let model = model_override.unwrap_or(&self.config.model_name);

        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|msg| GeminiContent {
                role: gemini_role(&msg.role),
                parts: vec![GeminiPart { text: &msg.content }],
            })
            .collect();
        contents.push(GeminiContent {
            role: "user",
            parts: vec![GeminiPart { text: current_turn }],
        });

        let body = GeminiChatRequest {
            system_instruction: Some(GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: &self.config.system_prompt,
                }],
            }),
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            },
        };

        let url = format!(
            "{GEMINI_BASE_URL}/models/{model}:generateContent?key={key}",
            key = self.config.api_key
        );

        let resp = self.http.post(&url).json(&body).send().await.map_err(|e| {
            error!("Gemini request failed: {}", e);
            if e.is_timeout() {
                ApiError::Upstream("Upstream request timed out".to_string())
            } else {
                ApiError::Upstream(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_else(|_| status.to_string());
            error!("Gemini returned {}: {}", status, text);
            return Err(classify_upstream(&text));
        }

        let parsed: GeminiChatResponse = resp.json().await.map_err(|e| {
            error!("Failed to decode Gemini response: {}", e);
            ApiError::Upstream(format!("Failed to decode Gemini response: {}", e))
        })?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Upstream("No candidates returned by Gemini".to_string()))?
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(ChatResponse {
            response: text,
            model: model.to_string(),
        })
    }
}

/// Gemini only knows "user" and "model" turn roles; system instructions
/// travel out of band, so both assistant and system history entries map to
/// "model".
fn gemini_role(role: &MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant | MessageRole::System => "model",
    }
}

#[derive(Serialize)]
struct GeminiChatRequest<'a> {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction<'a>>,
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiSystemInstruction<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiChatResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn non_user_roles_map_to_model() {
        assert_eq!(gemini_role(&MessageRole::User), "user");
        assert_eq!(gemini_role(&MessageRole::Assistant), "model");
        assert_eq!(gemini_role(&MessageRole::System), "model");
    }

    #[tokio::test]
    async fn unconfigured_service_returns_canned_response() {
        let service = LlmService::new(test_config(""));
        assert!(!service.is_configured());

        let messages = vec![ChatMessage {
            role: MessageRole::User,
            content: "Hi".to_string(),
        }];
        let res = service.chat(&messages, None).await.unwrap();
        assert!(!res.response.is_empty());
        assert_eq!(res.model, service.model());
    }

    #[tokio::test]
    async fn unconfigured_service_answers_even_an_empty_conversation() {
        let service = LlmService::new(test_config(""));
        let res = service.chat(&[], None).await.unwrap();
        assert!(!res.response.is_empty());
    }

    #[test]
    fn request_body_uses_gemini_field_names() {
        let body = GeminiChatRequest {
            system_instruction: Some(GeminiSystemInstruction {
                parts: vec![GeminiPart { text: "persona" }],
            }),
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: "Hi" }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                max_output_tokens: 1000,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("systemInstruction").is_some());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1000);
    }
}
