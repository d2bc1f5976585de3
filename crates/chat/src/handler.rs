//! The shipped chat handler: text in, generated reply out.

use std::sync::Arc;

use {anyhow::Context, async_trait::async_trait, tracing::debug};

use corvid_client::{HandlerContext, MessageContent, MessageHandler};

use crate::generate::Generator;

/// Fixed reply for inbound content the handler cannot interpret.
pub const TEXT_ONLY_REPLY: &str = "Sorry, I only understand text messages.";

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Replies to text messages with generated completions.
///
/// Non-text content short-circuits with [`TEXT_ONLY_REPLY`] and never
/// reaches the generation backend. Generation failures and empty
/// completions propagate as errors so the dispatcher answers with its
/// fixed apology.
pub struct ChatHandler {
    generator: Arc<dyn Generator>,
    system_prompt: String,
}

impl ChatHandler {
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[async_trait]
impl MessageHandler for ChatHandler {
    async fn handle(&self, context: &HandlerContext) -> anyhow::Result<()> {
        let text = match &context.message().content {
            MessageContent::Text(text) => text,
            MessageContent::Other { kind } => {
                debug!(%kind, "unsupported content kind, sending text-only notice");
                context
                    .reply(TEXT_ONLY_REPLY)
                    .await
                    .context("failed to send text-only notice")?;
                return Ok(());
            },
        };

        let reply = self
            .generator
            .generate(&self.system_prompt, context.history(), text)
            .await
            .context("generation backend failed")?;
        if reply.trim().is_empty() {
            anyhow::bail!("generation backend returned an empty completion");
        }

        context.reply(&reply).await.context("failed to send reply")?;
        Ok(())
    }
}
