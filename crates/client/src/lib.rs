//! Resilient ingestion client for the Corvid messaging network.
//!
//! Establishes an identity-bound session, consumes the live stream of
//! inbound messages one at a time, assembles a bounded per-correspondent
//! history window, and dispatches each message to a [`MessageHandler`]
//! behind a failure boundary. A bounded-retry supervisor rebuilds the
//! session when the connection or the stream drops.
//!
//! Processing is an at-least-once, strictly sequential pipeline: per-message
//! failures are contained at the dispatcher and consumer, and only session-
//! and stream-level failures reach [`supervise`].

pub mod address;
pub mod consumer;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod identity;
pub mod relay;
pub mod session;
pub mod supervisor;
pub mod transport;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod testing;

pub use {
    address::Address,
    consumer::{HistoryPolicy, consume},
    context::HandlerContext,
    dispatch::{APOLOGY_REPLY, Dispatcher, MessageHandler},
    error::{Error, Result},
    history::{DialogueEntry, HISTORY_WINDOW, Role, load_history},
    identity::Identity,
    relay::RelayTransport,
    session::{NetworkEnv, Session, SessionConfig},
    supervisor::{RetryBudget, supervise},
    transport::{
        Connection, Conversation, InboundMessage, MessageContent, MessageStream, StoredMessage,
        Transport,
    },
};
