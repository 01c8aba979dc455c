use codemetry_core::{AiConfig, AiExplainer, CodemetryError, ExplainFuture, WindowDigest};

use crate::client::{ChatClient, ChatMessage, Role};
use crate::prompt;

/// [`AiExplainer`] backed by an OpenAI-compatible chat endpoint.
///
/// Construction fails without a credential so the caller can degrade to an
/// `AI_UNAVAILABLE` confounder up front instead of failing per request.
///
/// # Examples
///
/// ```
/// use codemetry_core::AiConfig;
/// use codemetry_ai::HttpExplainer;
///
/// assert!(HttpExplainer::from_config(&AiConfig::default()).is_err());
///
/// let config = AiConfig {
///     api_key: Some("test-key".into()),
///     ..AiConfig::default()
/// };
/// assert!(HttpExplainer::from_config(&config).is_ok());
/// ```
#[derive(Debug)]
pub struct HttpExplainer {
    client: ChatClient,
}

impl HttpExplainer {
    /// Build an explainer from the AI configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::Ai`] when no API credential is configured
    /// and [`CodemetryError::Config`] for an unknown engine.
    pub fn from_config(config: &AiConfig) -> Result<Self, CodemetryError> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(CodemetryError::Ai(
                "no API credential configured for the ai engine".into(),
            ));
        }
        Ok(Self {
            client: ChatClient::new(config)?,
        })
    }

    /// Effective model name, for diagnostics.
    pub fn model(&self) -> &str {
        self.client.model()
    }
}

impl AiExplainer for HttpExplainer {
    fn explain(&self, digest: WindowDigest) -> ExplainFuture<'_> {
        Box::pin(async move {
            let messages = vec![
                ChatMessage {
                    role: Role::System,
                    content: prompt::build_system_prompt(),
                },
                ChatMessage {
                    role: Role::User,
                    content: prompt::build_window_prompt(&digest)?,
                },
            ];
            let response = self.client.chat(messages).await?;
            prompt::parse_explanation(&response)
        })
    }
}
