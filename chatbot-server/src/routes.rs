use crate::error::ApiError;
use crate::llm::LlmService;
use axum::{
    routing::{get, post},
    Json, Router,
};
use chatbot_shared::{
    ChatMessage, ChatRequest, ChatResponse, GenerateRequest, GenerateResponse, HealthResponse,
    MessageRole, RootResponse,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn app(llm: Arc<LlmService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get({
            let llm = llm.clone();
            move || health(llm)
        }))
        .route("/api/health", get({
            let llm = llm.clone();
            move || health(llm)
        }))
        .route("/api/chat", post({
            let llm = llm.clone();
            move |req| chat(req, llm)
        }))
        .route("/api/generate", post({
            let llm = llm.clone();
            move |req| generate(req, llm)
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "AI Chatbot API is running".to_string(),
        status: "ok".to_string(),
    })
}

async fn health(llm: Arc<LlmService>) -> Json<HealthResponse> {
    let response = if llm.is_configured() {
        HealthResponse {
            status: "ok".to_string(),
            message: "Backend server is running".to_string(),
        }
    } else {
        HealthResponse {
            status: "warning".to_string(),
            message: "API key not configured, responses are mocked".to_string(),
        }
    };
    Json(response)
}

async fn chat(
    Json(request): Json<ChatRequest>,
    llm: Arc<LlmService>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = llm
        .chat(&request.messages, request.model.as_deref())
        .await?;
    Ok(Json(response))
}

/// Single-prompt convenience: wrap the prompt as one user message and reuse
/// the chat path.
async fn generate(
    Json(request): Json<GenerateRequest>,
    llm: Arc<LlmService>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let messages = vec![ChatMessage {
        role: MessageRole::User,
        content: request.prompt,
    }];
    let chat_response = llm.chat(&messages, None).await?;
    Ok(Json(GenerateResponse {
        text: chat_response.response,
    }))
}
