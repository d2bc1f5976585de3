//! Per-message handler context.

use crate::{
    error::{Error, Result},
    history::DialogueEntry,
    session::Session,
    transport::InboundMessage,
};

/// Immutable bundle handed to the handler for exactly one inbound message:
/// the message, its sender's history window, and the session it arrived on.
pub struct HandlerContext {
    message: InboundMessage,
    history: Vec<DialogueEntry>,
    session: Session,
}

impl HandlerContext {
    #[must_use]
    pub fn new(message: InboundMessage, history: Vec<DialogueEntry>, session: Session) -> Self {
        Self {
            message,
            history,
            session,
        }
    }

    #[must_use]
    pub fn message(&self) -> &InboundMessage {
        &self.message
    }

    /// The sender's prior turns, oldest first, excluding this message.
    #[must_use]
    pub fn history(&self) -> &[DialogueEntry] {
        &self.history
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send `text` into the conversation this message arrived on.
    ///
    /// This is the only way a handler communicates output.
    pub async fn reply(&self, text: &str) -> Result<()> {
        self.message
            .conversation
            .send_text(text)
            .await
            .map_err(|error| Error::reply_send(error))
    }
}
