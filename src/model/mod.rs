use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use crate::catalog::Catalog;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt";

const API_KEY_HEADER: &str = "x-goog-api-key";

const TEMPERATURE: f64 = 0.2;
const TOP_K: u32 = 20;
const TOP_P: f64 = 0.9;
const MAX_OUTPUT_TOKENS: u32 = 1500;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{}", EMPTY_PROMPT_MESSAGE)]
    EmptyPrompt,

    #[error("request to generation service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("bad server response: HTTP {0}")]
    BadStatus(StatusCode),

    #[error("could not parse generation response")]
    Unparseable,

    #[error("failed to serialize catalog: {0}")]
    Catalog(#[from] serde_json::Error),
}

/// Connection settings for the generative-language endpoint.
#[derive(Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

// Hand-written so the key never ends up in logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

// A wrapper for the generateContent API
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        info!(
            "Using generation model {} at {}",
            config.model, config.base_url
        );
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Asks the model to pick the best catalog entry for `prompt`.
    pub async fn generate(&self, prompt: &str, catalog: &Catalog) -> Result<String, GenerateError> {
        if prompt.trim().is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }

        let full_prompt = build_prompt(prompt, catalog)?;
        let payload = request_body(&full_prompt);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        info!("Sending generation request ({} prompt chars)", prompt.len());
        debug!("Payload: {}", payload);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.without_url()))?;

        if response.status() != StatusCode::OK {
            warn!("Generation request failed with status {}", response.status());
            return Err(GenerateError::BadStatus(response.status()));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            warn!("Generation response was not JSON: {}", e.without_url());
            GenerateError::Unparseable
        })?;
        debug!("Response JSON: {}", response_json);

        let text = extract_text(&response_json).ok_or(GenerateError::Unparseable)?;

        info!("Response length: {} characters", text.len());
        Ok(text.to_string())
    }
}

fn build_prompt(prompt: &str, catalog: &Catalog) -> Result<String, serde_json::Error> {
    let models = serde_json::to_string(catalog.records())?;
    Ok(format!(
        "Based on: {prompt}\n\
         Recommend the best AI model from: {models}\n\
         Format:\n\
         🏆 Best Model: [Model Name]\n\
         💡 Reason: [Detailed analysis]\n\
         🛠️ Implementation Steps:\n\
         - [Step 1]\n\
         - [Step 2]\n\
         - [Step 3]"
    ))
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "safetySettings": [{
            "category": "HARM_CATEGORY_DANGEROUS_CONTENT",
            "threshold": "BLOCK_ONLY_HIGH"
        }],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "topK": TOP_K,
            "topP": TOP_P,
            "maxOutputTokens": MAX_OUTPUT_TOKENS
        }
    })
}

fn extract_text(response: &Value) -> Option<&str> {
    response
        .get("candidates")
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.get(0))
        .and_then(|part| part.get("text"))
        .and_then(|text| text.as_str())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::tests::BUNDLED;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            base_url: server.uri(),
            model: DEFAULT_MODEL.to_string(),
            api_key: "test-key".to_string(),
        })
    }

    pub(crate) fn answer(text: &str) -> Value {
        json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }

    fn catalog() -> Catalog {
        Catalog::from_json_str(BUNDLED).unwrap()
    }

    #[test]
    fn prompt_embeds_input_and_catalog() {
        let prompt = build_prompt("summarise contracts", &catalog()).unwrap();
        assert!(prompt.starts_with("Based on: summarise contracts\n"));
        assert!(prompt.contains("\"id\":\"aleph-alpha-luminous\""));
        assert!(prompt.contains("\"apiDocs\":"));
    }

    #[test]
    fn body_carries_generation_settings() {
        let body = request_body("hi");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["generationConfig"]["topK"], 20);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1500);
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_ONLY_HIGH");
    }

    #[test]
    fn extract_text_requires_full_path() {
        assert_eq!(extract_text(&answer("ok")), Some("ok"));
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
        assert_eq!(
            extract_text(&json!({ "candidates": [{ "content": { "parts": [{ "text": 3 }] } }] })),
            None
        );
    }

    #[tokio::test]
    async fn returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "topK": 20, "maxOutputTokens": 1500 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("🏆 Best Model: Whisper")))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate("transcribe meetings", &catalog())
            .await
            .unwrap();
        assert_eq!(text, "🏆 Best Model: Whisper");
    }

    #[tokio::test]
    async fn empty_prompt_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("unused")))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).generate("  ", &catalog()).await.unwrap_err();
        assert!(matches!(err, GenerateError::EmptyPrompt));
        assert_eq!(err.to_string(), EMPTY_PROMPT_MESSAGE);
    }

    #[tokio::test]
    async fn non_ok_status_is_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("hello", &catalog()).await.unwrap_err();
        assert!(matches!(err, GenerateError::BadStatus(code) if code == StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn missing_text_is_unparseable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("hello", &catalog()).await.unwrap_err();
        assert!(matches!(err, GenerateError::Unparseable));
    }

    #[tokio::test]
    async fn non_json_body_is_unparseable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("hello", &catalog()).await.unwrap_err();
        assert!(matches!(err, GenerateError::Unparseable));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let client = GeminiClient::new(GeminiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: "test-key".to_string(),
        });

        let err = client.generate("hello", &catalog()).await.unwrap_err();
        assert!(matches!(err, GenerateError::Transport(_)));
    }

    #[tokio::test]
    async fn key_stays_out_of_url_and_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("ok")))
            .mount(&server)
            .await;

        client_for(&server).generate("hello", &catalog()).await.unwrap();
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].url.as_str().contains("test-key"));

        let offline = GeminiClient::new(GeminiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: "SUPER-SECRET-KEY".to_string(),
        });
        let err = offline.generate("hello", &catalog()).await.unwrap_err();
        assert!(!err.to_string().contains("SUPER-SECRET-KEY"));
        assert!(!format!("{err:?}").contains("SUPER-SECRET-KEY"));
    }
}
