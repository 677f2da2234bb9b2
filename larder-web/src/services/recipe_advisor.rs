//! Recipe suggestions from the Gemini `generateContent` API
//!
//! The advisor never fails the page: every error is folded into the returned
//! text as `Error fetching recipe suggestions: <detail>`.

use std::time::Duration;

use async_trait::async_trait;
use larder_common::Ingredient;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const USER_AGENT: &str = concat!("larder/", env!("CARGO_PKG_VERSION"));

/// Shown when the model answers with nothing
pub const NO_SUGGESTIONS: &str = "No recipe suggestions available.";

/// Gemini client errors
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// No API key configured
    #[error("Gemini API key not configured")]
    NotConfigured,

    /// Network communication error (including timeouts)
    #[error("Network error: {0}")]
    Network(String),

    /// API returned an error status or error body
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Failed to parse the response JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Produces recipe suggestions for the current inventory
#[async_trait]
pub trait RecipeAdvisor: Send + Sync {
    async fn suggest(&self, ingredients: &[Ingredient]) -> String;
}

/// `I have these ingredients: Rice (2 kg), Milk (0.5 l). Suggest 3 ...`
pub fn build_prompt(ingredients: &[Ingredient]) -> String {
    let list: Vec<String> = ingredients
        .iter()
        .map(|i| format!("{} ({})", i.name, i.amount()))
        .collect();
    format!(
        "I have these ingredients: {}. Suggest 3 detailed recipes with step-by-step instructions, cooking time, and difficulty level.",
        list.join(", ")
    )
}

/// Text shown for a failed request
pub fn failure_text(error: &AdvisorError) -> String {
    format!("Error fetching recipe suggestions: {}", error)
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> String {
        self.candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Advisor backed by the Gemini REST API
pub struct GeminiAdvisor {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAdvisor {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AdvisorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AdvisorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Point the client at another endpoint root (local test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Send one prompt and return the trimmed reply
    pub async fn generate(&self, prompt: &str) -> Result<String, AdvisorError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        debug!(model = %self.model, "Querying Gemini API");

        let response = self
            .http_client
            .post(self.url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AdvisorError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdvisorError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GenerateResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map_or(body, |e| e.message);
            return Err(AdvisorError::Api(status.as_u16(), message));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| AdvisorError::Parse(e.to_string()))?;
        if let Some(error) = parsed.error {
            return Err(AdvisorError::Api(status.as_u16(), error.message));
        }

        Ok(parsed.text().trim().to_string())
    }
}

#[async_trait]
impl RecipeAdvisor for GeminiAdvisor {
    async fn suggest(&self, ingredients: &[Ingredient]) -> String {
        match self.generate(&build_prompt(ingredients)).await {
            Ok(text) if text.is_empty() => NO_SUGGESTIONS.to_string(),
            Ok(text) => {
                info!(ingredients = ingredients.len(), "Recipe suggestions received");
                text
            }
            Err(e) => {
                warn!("Recipe suggestion request failed: {}", e);
                failure_text(&e)
            }
        }
    }
}

/// Advisor used when no API key is configured
pub struct UnconfiguredAdvisor;

#[async_trait]
impl RecipeAdvisor for UnconfiguredAdvisor {
    async fn suggest(&self, _ingredients: &[Ingredient]) -> String {
        failure_text(&AdvisorError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::post, Json, Router};
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn pantry() -> Vec<Ingredient> {
        let added = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        vec![
            Ingredient::new("Rice", 2.0, "kg", added, 300),
            Ingredient::new("Milk", 0.5, "l", added, 5),
        ]
    }

    /// Serve `router` on an ephemeral port and return its base URL
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn advisor(base_url: &str) -> GeminiAdvisor {
        GeminiAdvisor::new("test-key", "gemini-1.5-pro", Duration::from_secs(5))
            .unwrap()
            .with_base_url(base_url)
    }

    #[test]
    fn test_prompt_lists_ingredients() {
        assert_eq!(
            build_prompt(&pantry()),
            "I have these ingredients: Rice (2 kg), Milk (0.5 l). Suggest 3 detailed recipes with step-by-step instructions, cooking time, and difficulty level."
        );
    }

    #[tokio::test]
    async fn test_successful_reply_is_trimmed() {
        let router = Router::new().route(
            "/models/:call",
            post(|Path(call): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(call, "gemini-1.5-pro:generateContent");
                let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or("");
                assert!(prompt.starts_with("I have these ingredients: Rice (2 kg)"));
                Json(json!({
                    "candidates": [{"content": {"role": "model", "parts": [{"text": "  Rice pudding\n"}]}}]
                }))
            }),
        );
        let base = serve(router).await;

        assert_eq!(advisor(&base).suggest(&pantry()).await, "Rice pudding");
    }

    #[tokio::test]
    async fn test_empty_reply_uses_fallback() {
        let router = Router::new().route(
            "/models/:call",
            post(|| async { Json(json!({"candidates": []})) }),
        );
        let base = serve(router).await;

        assert_eq!(advisor(&base).suggest(&pantry()).await, NO_SUGGESTIONS);
    }

    #[tokio::test]
    async fn test_api_error_becomes_text() {
        let router = Router::new().route(
            "/models/:call",
            post(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({"error": {"code": 403, "message": "API key not valid"}})),
                )
            }),
        );
        let base = serve(router).await;

        let text = advisor(&base).suggest(&pantry()).await;
        assert_eq!(
            text,
            "Error fetching recipe suggestions: API error 403: API key not valid"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_becomes_text() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let text = advisor(&format!("http://{}", addr)).suggest(&pantry()).await;
        assert!(text.starts_with("Error fetching recipe suggestions: Network error"));
    }

    #[tokio::test]
    async fn test_unconfigured_advisor() {
        assert_eq!(
            UnconfiguredAdvisor.suggest(&pantry()).await,
            "Error fetching recipe suggestions: Gemini API key not configured"
        );
    }
}
