use std::error::Error as StdError;

use crate::address::Address;

/// Crate-wide result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors for session, stream, and history operations.
///
/// Only [`Error::Config`] is fatal to the supervisor; everything else is
/// either retried at the session level or contained per message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Deterministic misconfiguration (bad environment tag, malformed
    /// signing key). Never retried.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Transient failure while establishing a session.
    #[error("failed to establish session: {message}")]
    Connection { message: String },

    /// The live message stream dropped or produced a malformed frame.
    #[error("message stream failed: {message}")]
    Stream { message: String },

    /// Conversation history for one correspondent could not be fetched.
    #[error("history fetch for {peer} failed: {message}")]
    HistoryFetch { peer: Address, message: String },

    /// A reply could not be delivered to the originating conversation.
    #[error("failed to send reply: {message}")]
    ReplySend { message: String },

    /// Malformed network address string.
    #[error("invalid address: {value:?}")]
    InvalidAddress { value: String },

    /// Wrapped source error from the transport implementation.
    #[error("transport error: {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn connection(message: impl std::fmt::Display) -> Self {
        Self::Connection {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn stream(message: impl std::fmt::Display) -> Self {
        Self::Stream {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn history_fetch(peer: Address, message: impl std::fmt::Display) -> Self {
        Self::HistoryFetch {
            peer,
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn reply_send(message: impl std::fmt::Display) -> Self {
        Self::ReplySend {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_address(value: impl Into<String>) -> Self {
        Self::InvalidAddress {
            value: value.into(),
        }
    }

    #[must_use]
    pub fn transport(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether the supervisor must give up instead of retrying.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
