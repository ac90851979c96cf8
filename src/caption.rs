use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::credential::Credential;

pub const CAPTION_MODEL: &str = "gpt-4o";
pub const MAX_OUTPUT_TOKENS: u32 = 60;
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that generates descriptive text.";
pub const NO_LABELS_CAPTION: &str = "No descriptive labels found.";

#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    #[error("HTTP error while calling the caption service: {0}")]
    Http(#[from] reqwest::Error),
    #[error("caption service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("caption service response carried no message content")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Body of one chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

impl CaptionRequest {
    pub fn for_labels(labels: &[String]) -> Self {
        Self {
            model: CAPTION_MODEL.to_string(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: build_prompt(labels),
                },
            ],
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

pub fn build_prompt(labels: &[String]) -> String {
    format!(
        "Create a descriptive sentence for an image containing the following elements: {}.",
        labels.join(", ")
    )
}

#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    /// Returns the raw generated message content.
    async fn complete(
        &self,
        request: &CaptionRequest,
        credential: &Credential,
    ) -> Result<String, CaptionError>;
}

/// Turns label names into one caption. An empty list never reaches the
/// generator.
pub async fn describe_labels(
    generator: &dyn CaptionGenerator,
    labels: &[String],
    credential: &Credential,
) -> Result<String, CaptionError> {
    if labels.is_empty() {
        return Ok(NO_LABELS_CAPTION.to_string());
    }

    let request = CaptionRequest::for_labels(labels);
    debug!(labels = labels.len(), model = %request.model, "requesting caption");

    let content = generator.complete(&request, credential).await?;
    Ok(content.trim().to_string())
}
