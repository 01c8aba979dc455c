use std::time::Duration;

use codemetry_core::{AiConfig, CodemetryError};
use serde::{Deserialize, Serialize};

/// A message in a chat conversation with the explanation model.
///
/// # Examples
///
/// ```
/// use codemetry_ai::client::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Explain this window".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use codemetry_ai::client::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// Endpoint and model defaults for one named engine.
///
/// Every supported engine speaks the OpenAI chat-completions dialect, either
/// natively or through its compatibility endpoint, so one client covers all
/// of them.
///
/// # Examples
///
/// ```
/// use codemetry_ai::client::EngineProfile;
///
/// let profile = EngineProfile::resolve("deepseek").unwrap();
/// assert_eq!(profile.default_model, "deepseek-chat");
/// assert!(EngineProfile::resolve("clippy-gpt").is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EngineProfile {
    /// Base URL up to (not including) `/chat/completions`.
    pub base_url: &'static str,
    /// Model used when the configuration does not override it.
    pub default_model: &'static str,
}

impl EngineProfile {
    /// Look up the profile for an engine name.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::Config`] for an unknown engine.
    pub fn resolve(engine: &str) -> Result<Self, CodemetryError> {
        match engine {
            "openai" => Ok(Self {
                base_url: "https://api.openai.com/v1",
                default_model: "gpt-4o-mini",
            }),
            "anthropic" => Ok(Self {
                base_url: "https://api.anthropic.com/v1",
                default_model: "claude-3-5-haiku-latest",
            }),
            "deepseek" => Ok(Self {
                base_url: "https://api.deepseek.com/v1",
                default_model: "deepseek-chat",
            }),
            "google" => Ok(Self {
                base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
                default_model: "gemini-2.0-flash",
            }),
            other => Err(CodemetryError::Config(format!(
                "unknown ai engine '{other}' (expected openai, anthropic, deepseek, or google)"
            ))),
        }
    }
}

/// OpenAI-compatible chat completions client.
///
/// # Examples
///
/// ```
/// use codemetry_core::AiConfig;
/// use codemetry_ai::client::ChatClient;
///
/// let config = AiConfig {
///     api_key: Some("test-key".into()),
///     ..AiConfig::default()
/// };
/// let client = ChatClient::new(&config).unwrap();
/// assert_eq!(client.model(), "gpt-4o-mini");
/// ```
#[derive(Debug)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatClient {
    /// Create a client from the AI configuration.
    ///
    /// Engine defaults fill in whatever `model` and `base_url` the
    /// configuration leaves unset.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::Config`] for an unknown engine and
    /// [`CodemetryError::Ai`] if the HTTP client cannot be built.
    pub fn new(config: &AiConfig) -> Result<Self, CodemetryError> {
        let profile = EngineProfile::resolve(&config.engine)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CodemetryError::Ai(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| profile.base_url.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| profile.default_model.to_string()),
            api_key: config.api_key.clone(),
        })
    }

    /// Return the effective model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion request and return the text response.
    ///
    /// Builds a request to `{base_url}/chat/completions` with temperature
    /// 0.1 and JSON response format.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::Ai`] on HTTP errors or response parsing
    /// failures.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, CodemetryError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.1,
            "response_format": { "type": "json_object" },
        });

        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }
        request = request.header("Content-Type", "application/json");

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| CodemetryError::Ai(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(CodemetryError::Ai(format!(
                "explanation API error {status}: {body_text}"
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CodemetryError::Ai(format!("failed to parse response: {e}")))?;

        let content = response_body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                CodemetryError::Ai(format!("unexpected response structure: {response_body}"))
            })?;

        Ok(content.to_string())
    }
}
