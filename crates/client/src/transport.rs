//! Transport seams for the messaging network.
//!
//! The network's identity cryptography and wire encoding live behind these
//! traits; the ingestion pipeline only sees addresses, tagged content, and
//! conversation handles. [`crate::relay`] provides the shipped
//! implementation.

use std::{fmt, pin::Pin, sync::Arc};

use {async_trait::async_trait, tokio_stream::Stream};

use crate::{address::Address, error::Result, identity::Identity, session::NetworkEnv};

/// Live subscription to every inbound message for one identity.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<InboundMessage>> + Send>>;

/// Entry point into a messaging backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish an authenticated connection for `identity` against `env`.
    async fn connect(&self, identity: &Identity, env: NetworkEnv) -> Result<Arc<dyn Connection>>;
}

/// An authenticated connection to the messaging network.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Publish the identity's contact information so peers can initiate
    /// conversations with it.
    async fn publish_contact(&self) -> Result<()>;

    /// Every conversation the identity participates in.
    async fn conversations(&self) -> Result<Vec<Arc<dyn Conversation>>>;

    /// Open the live stream of inbound messages across all conversations.
    async fn stream_messages(&self) -> Result<MessageStream>;
}

/// A two-party conversation thread.
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Address of the other party.
    fn peer_address(&self) -> Address;

    /// Up to `limit` most recent messages, newest first.
    async fn recent_messages(&self, limit: usize) -> Result<Vec<StoredMessage>>;

    /// Send a text message into this conversation.
    async fn send_text(&self, text: &str) -> Result<()>;
}

/// Message payload, decided once at ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    /// Anything the handler cannot interpret: attachments, reactions,
    /// future content types. `kind` is the transport's tag.
    Other { kind: String },
}

impl MessageContent {
    /// Map a wire-level kind tag and optional body to a content variant.
    #[must_use]
    pub fn from_wire(kind: impl Into<String>, text: Option<String>) -> Self {
        let kind = kind.into();
        match (kind.as_str(), text) {
            ("text", Some(text)) => Self::Text(text),
            (_, _) => Self::Other { kind },
        }
    }
}

/// A message pulled from the live stream, together with the handle of the
/// conversation it arrived on.
#[derive(Clone)]
pub struct InboundMessage {
    pub sender: Address,
    pub content: MessageContent,
    pub conversation: Arc<dyn Conversation>,
}

impl fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundMessage")
            .field("sender", &self.sender)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

/// A message returned by history pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub sender: Address,
    pub content: MessageContent,
}
