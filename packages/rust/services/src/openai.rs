//! Text generation over an OpenAI-compatible `/chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tijdmachine_shared::{OpenAiConfig, Result, TextGenerator, TijdmachineError};
use tracing::{debug, instrument};

/// Longest slice of an error body quoted in error messages.
const ERROR_BODY_PREVIEW: usize = 300;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Chat-completions client holding one pooled HTTP connection set.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiClient {
    /// Build a client from config and an already-resolved API key.
    pub fn new(config: &OpenAiConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TijdmachineError::config("OpenAI API key is empty"));
        }

        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TijdmachineError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, input_len = user_text.len()))]
    async fn complete(
        &self,
        system_instruction: &str,
        user_text: &str,
        temperature: Option<f32>,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: temperature.unwrap_or(self.temperature),
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TijdmachineError::Network(format!("chat completion request: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TijdmachineError::Network(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(TijdmachineError::Generation(format!(
                "HTTP {status}: {}",
                preview(&body)
            )));
        }

        let text = parse_completion(&body)?;
        debug!(output_len = text.len(), "completion received");
        Ok(text)
    }
}

/// Pull the first choice's text out of a chat-completions response body.
fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        TijdmachineError::parse(format!(
            "invalid chat completion response: {e} (got: {})",
            preview(body)
        ))
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| TijdmachineError::Generation("response has no message content".into()))
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_PREVIEW) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_correctly() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            temperature: 0.3,
            messages: [
                ChatMessage {
                    role: "system",
                    content: "Summarize.",
                },
                ChatMessage {
                    role: "user",
                    content: "Men schrijft uit Londen",
                },
            ],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""model":"gpt-4o-mini""#));
        assert!(json.contains(r#""role":"system","content":"Summarize.""#));
        assert!(json.contains(r#""role":"user""#));
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Een samenvatting."}},{"index":1,"message":{"role":"assistant","content":"other"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Een samenvatting.");
    }

    #[test]
    fn null_content_is_an_error() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let err = parse_completion(body).unwrap_err();
        assert!(matches!(err, TijdmachineError::Generation(_)));
    }

    #[test]
    fn missing_choices_is_an_error() {
        assert!(parse_completion(r#"{"choices":[]}"#).is_err());
        assert!(parse_completion(r#"{"error":{"message":"quota"}}"#).is_err());
    }

    #[test]
    fn garbage_body_is_a_parse_error() {
        let err = parse_completion("<html>bad gateway</html>").unwrap_err();
        assert!(err.to_string().contains("invalid chat completion response"));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let long = "é".repeat(ERROR_BODY_PREVIEW + 10);
        assert_eq!(preview(&long).chars().count(), ERROR_BODY_PREVIEW);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn rejects_empty_api_key() {
        assert!(OpenAiClient::new(&OpenAiConfig::default(), "  ").is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let client = OpenAiClient::new(&OpenAiConfig::default(), "sk-secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    fn client_for(server: &wiremock::MockServer) -> OpenAiClient {
        let config = OpenAiConfig {
            base_url: format!("{}/v1/", server.uri()),
            ..OpenAiConfig::default()
        };
        OpenAiClient::new(&config, "sk-test").unwrap()
    }

    #[tokio::test]
    async fn complete_posts_chat_request_with_bearer_key() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/v1/chat/completions"))
            .and(wiremock::matchers::header("authorization", "Bearer sk-test"))
            .and(wiremock::matchers::body_string_contains(r#""content":"Vat samen.""#))
            .and(wiremock::matchers::body_string_contains(r#""temperature":0.0"#))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                r#"{"choices":[{"message":{"role":"assistant","content":"De vloot is uitgevaren."}}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let text = client
            .complete("Vat samen.", "Men schrijft uit Texel", Some(0.0))
            .await
            .unwrap();
        assert_eq!(text, "De vloot is uitgevaren.");
    }

    #[tokio::test]
    async fn server_error_is_a_generation_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/v1/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(500).set_body_string("upstream overloaded"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("Vat samen.", "tekst", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TijdmachineError::Generation(_)));
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("upstream overloaded"));
    }

    #[tokio::test]
    async fn null_content_from_server_is_a_generation_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/v1/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
            ))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("Vat samen.", "tekst", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TijdmachineError::Generation(_)));
    }
}
