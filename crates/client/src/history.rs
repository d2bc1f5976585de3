//! Per-correspondent history window assembly.

use tracing::debug;

use crate::{
    address::Address,
    error::{Error, Result},
    session::Session,
    transport::MessageContent,
};

/// Page size for the history fetch. The newest entry of the page is the
/// triggering message itself, so the window holds at most one less.
pub const HISTORY_WINDOW: usize = 5;

/// Who authored a prior turn, relative to the session's own address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One normalized prior turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueEntry {
    pub role: Role,
    pub text: String,
}

impl DialogueEntry {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Load the bounded history window for one correspondent, oldest first.
///
/// A correspondent with no existing conversation gets an empty window; so
/// does a conversation whose only message is the one currently being
/// handled. The newest message of the fetched page is always discarded:
/// it is the triggering message, already surfaced as the inbound message,
/// and must not appear in its own history.
pub async fn load_history(session: &Session, peer: Address) -> Result<Vec<DialogueEntry>> {
    let conversations = session
        .connection()
        .conversations()
        .await
        .map_err(|error| Error::history_fetch(peer, error))?;

    let Some(conversation) = conversations
        .into_iter()
        .find(|conversation| conversation.peer_address() == peer)
    else {
        return Ok(Vec::new());
    };

    let mut messages = conversation
        .recent_messages(HISTORY_WINDOW)
        .await
        .map_err(|error| Error::history_fetch(peer, error))?;
    if messages.is_empty() {
        return Ok(Vec::new());
    }
    messages.remove(0);

    let own = session.address();
    let mut entries: Vec<DialogueEntry> = messages
        .into_iter()
        .filter_map(|message| match message.content {
            MessageContent::Text(text) => Some(DialogueEntry {
                role: if message.sender == own {
                    Role::Assistant
                } else {
                    Role::User
                },
                text,
            }),
            MessageContent::Other { kind } => {
                debug!(%kind, "skipping non-text message in history window");
                None
            },
        })
        .collect();
    entries.reverse();
    Ok(entries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{
        ConnectOutcome, FakeConnection, FakeConversation, FakeTransport, connect_fake,
        own_address, peer_address, stored_other, stored_text,
    };

    async fn session_with(conversation: Arc<FakeConversation>) -> Session {
        let transport = FakeTransport::new(vec![ConnectOutcome::Succeed(Arc::new(
            FakeConnection::new().with_conversation(conversation),
        ))]);
        connect_fake(&transport).await
    }

    #[tokio::test]
    async fn first_contact_has_no_history() {
        let transport = FakeTransport::new(vec![ConnectOutcome::Succeed(Arc::new(
            FakeConnection::new(),
        ))]);
        let session = connect_fake(&transport).await;
        let history = load_history(&session, peer_address(1)).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn single_message_conversation_has_no_history() {
        let peer = peer_address(1);
        let conversation = Arc::new(
            FakeConversation::new(peer).with_messages(vec![stored_text(peer, "hello")]),
        );
        let session = session_with(conversation).await;
        let history = load_history(&session, peer).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn window_discards_the_trigger_and_runs_chronologically() {
        let peer = peer_address(1);
        let own = own_address();
        // Newest first, as the transport returns them.
        let conversation = Arc::new(FakeConversation::new(peer).with_messages(vec![
            stored_text(peer, "trigger"),
            stored_text(own, "second reply"),
            stored_text(peer, "second question"),
            stored_text(own, "first reply"),
            stored_text(peer, "first question"),
        ]));
        let session = session_with(conversation).await;

        let history = load_history(&session, peer).await.unwrap();
        assert_eq!(
            history,
            vec![
                DialogueEntry::user("first question"),
                DialogueEntry::assistant("first reply"),
                DialogueEntry::user("second question"),
                DialogueEntry::assistant("second reply"),
            ]
        );
        assert!(history.len() <= HISTORY_WINDOW - 1);
    }

    #[tokio::test]
    async fn window_never_exceeds_the_page_minus_trigger() {
        let peer = peer_address(1);
        let messages: Vec<_> = (0..HISTORY_WINDOW)
            .map(|i| stored_text(peer, format!("message {i}")))
            .collect();
        let conversation = Arc::new(FakeConversation::new(peer).with_messages(messages));
        let session = session_with(conversation).await;

        let history = load_history(&session, peer).await.unwrap();
        assert_eq!(history.len(), HISTORY_WINDOW - 1);
        assert!(!history.iter().any(|entry| entry.text == "message 0"));
    }

    #[tokio::test]
    async fn non_text_messages_are_skipped() {
        let peer = peer_address(1);
        let conversation = Arc::new(FakeConversation::new(peer).with_messages(vec![
            stored_text(peer, "trigger"),
            stored_other(peer, "attachment"),
            stored_text(peer, "hello"),
        ]));
        let session = session_with(conversation).await;

        let history = load_history(&session, peer).await.unwrap();
        assert_eq!(history, vec![DialogueEntry::user("hello")]);
    }

    #[tokio::test]
    async fn loading_twice_is_idempotent() {
        let peer = peer_address(1);
        let conversation = Arc::new(FakeConversation::new(peer).with_messages(vec![
            stored_text(peer, "trigger"),
            stored_text(own_address(), "reply"),
            stored_text(peer, "question"),
        ]));
        let session = session_with(conversation).await;

        let first = load_history(&session, peer).await.unwrap();
        let second = load_history(&session, peer).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn fetch_failure_is_a_history_error() {
        let peer = peer_address(1);
        let conversation = Arc::new(FakeConversation::new(peer).failing_fetch());
        let session = session_with(conversation).await;

        let error = load_history(&session, peer).await.unwrap_err();
        assert!(matches!(error, Error::HistoryFetch { .. }));
    }
}
