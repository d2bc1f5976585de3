//! In-memory fakes for exercising the pipeline without a network.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use {async_trait::async_trait, secrecy::SecretString};

use crate::{
    address::Address,
    context::HandlerContext,
    dispatch::MessageHandler,
    error::{Error, Result},
    history::DialogueEntry,
    identity::Identity,
    session::{NetworkEnv, Session, SessionConfig},
    transport::{
        Connection, Conversation, InboundMessage, MessageContent, MessageStream, StoredMessage,
        Transport,
    },
};

pub(crate) const TEST_KEY: &str =
    "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

pub(crate) fn test_session_config() -> SessionConfig {
    SessionConfig {
        signing_key: Some(SecretString::new(TEST_KEY.into())),
        env: "dev".into(),
    }
}

/// Address the test session receives on.
pub(crate) fn own_address() -> Address {
    Identity::from_key(&SecretString::new(TEST_KEY.into()))
        .unwrap()
        .address()
}

pub(crate) fn peer_address(tag: u8) -> Address {
    Address::from_bytes([tag; 20])
}

pub(crate) fn stored_text(sender: Address, text: impl Into<String>) -> StoredMessage {
    StoredMessage {
        sender,
        content: MessageContent::Text(text.into()),
    }
}

pub(crate) fn stored_other(sender: Address, kind: impl Into<String>) -> StoredMessage {
    StoredMessage {
        sender,
        content: MessageContent::Other { kind: kind.into() },
    }
}

pub(crate) fn text_message(
    sender: Address,
    conversation: &Arc<FakeConversation>,
    text: impl Into<String>,
) -> InboundMessage {
    InboundMessage {
        sender,
        content: MessageContent::Text(text.into()),
        conversation: Arc::clone(conversation) as Arc<dyn Conversation>,
    }
}

pub(crate) async fn connect_fake(transport: &FakeTransport) -> Session {
    Session::connect(transport, &test_session_config())
        .await
        .unwrap()
}

fn simulated(context: &'static str) -> Error {
    Error::transport(context, std::io::Error::other("simulated failure"))
}

// ── Conversation ────────────────────────────────────────────────────────────

pub(crate) struct FakeConversation {
    peer: Address,
    messages: Mutex<Vec<StoredMessage>>,
    sent: Mutex<Vec<String>>,
    fail_fetch: AtomicBool,
    fail_send: AtomicBool,
}

impl FakeConversation {
    pub(crate) fn new(peer: Address) -> Self {
        Self {
            peer,
            messages: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
        }
    }

    /// Seed stored messages, newest first.
    pub(crate) fn with_messages(self, messages: Vec<StoredMessage>) -> Self {
        *self.messages.lock().unwrap() = messages;
        self
    }

    pub(crate) fn failing_fetch(self) -> Self {
        self.fail_fetch.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_send(self) -> Self {
        self.fail_send.store(true, Ordering::SeqCst);
        self
    }

    /// Everything sent into this conversation, in order.
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Conversation for FakeConversation {
    fn peer_address(&self) -> Address {
        self.peer
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<StoredMessage>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(simulated("recent_messages"));
        }
        let messages = self.messages.lock().unwrap();
        Ok(messages.iter().take(limit).cloned().collect())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(simulated("send_text"));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

// ── Connection ──────────────────────────────────────────────────────────────

pub(crate) struct FakeConnection {
    conversations: Mutex<Vec<Arc<FakeConversation>>>,
    stream_items: Mutex<Option<Vec<Result<InboundMessage>>>>,
    fail_publish: AtomicBool,
}

impl FakeConnection {
    pub(crate) fn new() -> Self {
        Self {
            conversations: Mutex::new(Vec::new()),
            stream_items: Mutex::new(None),
            fail_publish: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_conversation(self, conversation: Arc<FakeConversation>) -> Self {
        self.conversations.lock().unwrap().push(conversation);
        self
    }

    pub(crate) fn with_stream(self, items: Vec<Result<InboundMessage>>) -> Self {
        *self.stream_items.lock().unwrap() = Some(items);
        self
    }

    pub(crate) fn failing_publish(self) -> Self {
        self.fail_publish.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn publish_contact(&self) -> Result<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(simulated("publish_contact"));
        }
        Ok(())
    }

    async fn conversations(&self) -> Result<Vec<Arc<dyn Conversation>>> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .map(|conversation| Arc::clone(conversation) as Arc<dyn Conversation>)
            .collect())
    }

    async fn stream_messages(&self) -> Result<MessageStream> {
        let items = self.stream_items.lock().unwrap().take().unwrap_or_default();
        Ok(Box::pin(tokio_stream::iter(items)))
    }
}

// ── Transport ───────────────────────────────────────────────────────────────

pub(crate) enum ConnectOutcome {
    Fail(Error),
    Succeed(Arc<FakeConnection>),
}

pub(crate) struct FakeTransport {
    outcomes: Mutex<VecDeque<ConnectOutcome>>,
    connects: AtomicUsize,
}

impl FakeTransport {
    pub(crate) fn new(outcomes: Vec<ConnectOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            connects: AtomicUsize::new(0),
        }
    }

    /// Number of connect attempts made so far.
    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(
        &self,
        _identity: &Identity,
        _env: NetworkEnv,
    ) -> Result<Arc<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(ConnectOutcome::Succeed(connection)) => Ok(connection as Arc<dyn Connection>),
            Some(ConnectOutcome::Fail(error)) => Err(error),
            None => Err(Error::connection("no scripted connect outcome left")),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeenMessage {
    pub(crate) sender: Address,
    pub(crate) history: Vec<DialogueEntry>,
}

pub(crate) struct CapturingHandler {
    seen: Mutex<Vec<SeenMessage>>,
    fail: bool,
}

impl CapturingHandler {
    pub(crate) fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A handler that records the message and then fails.
    pub(crate) fn failing() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn seen(&self) -> Vec<SeenMessage> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageHandler for CapturingHandler {
    async fn handle(&self, context: &HandlerContext) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(SeenMessage {
            sender: context.message().sender,
            history: context.history().to_vec(),
        });
        if self.fail {
            anyhow::bail!("simulated handler failure");
        }
        Ok(())
    }
}
