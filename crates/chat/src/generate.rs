//! Text-generation backend interface and the OpenAI-compatible client.

use {
    anyhow::Context,
    async_trait::async_trait,
    secrecy::{ExposeSecret, SecretString},
    serde::Deserialize,
    serde_json::json,
};

use corvid_client::DialogueEntry;

/// Default base URL for the generation backend.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Opaque text-generation backend: dialogue in, reply text out.
///
/// Failures propagate to the caller; the dispatcher turns them into a
/// user-visible apology instead of a crash.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[DialogueEntry],
        user_text: &str,
    ) -> anyhow::Result<String>;
}

/// Chat-completions client for any OpenAI-compatible backend.
pub struct OpenAiGenerator {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl OpenAiGenerator {
    #[must_use]
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key,
            model: model.into(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[DialogueEntry],
        user_text: &str,
    ) -> anyhow::Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(json!({ "role": "system", "content": system_prompt }));
        for entry in history {
            messages.push(json!({ "role": entry.role.as_str(), "content": entry.text }));
        }
        messages.push(json!({ "role": "user", "content": user_text }));

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({ "model": self.model, "messages": messages }))
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion returned an error status")?;

        let completion: CompletionResponse = response
            .json()
            .await
            .context("malformed chat completion response")?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("chat completion contained no message content")
    }
}
