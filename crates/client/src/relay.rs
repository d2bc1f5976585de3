//! Relay-backed transport.
//!
//! Talks to a Corvid relay server: REST for contact publication,
//! conversation listing, history pagination, and sends; a WebSocket for the
//! live inbound stream. Wire frames are JSON.

use std::sync::Arc;

use {
    async_trait::async_trait,
    futures::StreamExt,
    secrecy::{ExposeSecret, SecretString},
    serde::{Deserialize, Serialize},
    tokio_tungstenite::{connect_async, tungstenite::Message},
    tracing::{debug, info},
};

use crate::{
    address::Address,
    error::{Error, Result},
    identity::Identity,
    session::NetworkEnv,
    transport::{
        Connection, Conversation, InboundMessage, MessageContent, MessageStream, StoredMessage,
        Transport,
    },
};

/// Relay endpoints for the supported network environments.
const PRODUCTION_RELAY_URL: &str = "https://relay.corvid.network";
const DEV_RELAY_URL: &str = "https://relay.dev.corvid.network";

/// Transport over a Corvid relay server.
pub struct RelayTransport {
    http: reqwest::Client,
    relay_url: Option<String>,
}

impl RelayTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            relay_url: None,
        }
    }

    /// Override the relay URL implied by the network environment.
    #[must_use]
    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = Some(url.into());
        self
    }
}

impl Default for RelayTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RelayTransport {
    async fn connect(&self, identity: &Identity, env: NetworkEnv) -> Result<Arc<dyn Connection>> {
        let base_url = self
            .relay_url
            .clone()
            .unwrap_or_else(|| default_relay_url(env).to_string())
            .trim_end_matches('/')
            .to_string();
        debug!(%base_url, env = env.as_str(), "using relay");
        Ok(Arc::new(RelayConnection {
            http: self.http.clone(),
            base_url,
            token: identity.auth_token(),
            address: identity.address(),
        }))
    }
}

fn default_relay_url(env: NetworkEnv) -> &'static str {
    match env {
        NetworkEnv::Production => PRODUCTION_RELAY_URL,
        NetworkEnv::Dev => DEV_RELAY_URL,
    }
}

/// WebSocket endpoint for the live stream, derived from the REST base URL.
fn stream_url(base_url: &str, token: &str) -> String {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    };
    format!("{ws_base}/v1/stream?token={token}")
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ContactBundle {
    address: String,
}

#[derive(Debug, Deserialize)]
struct ConversationEntry {
    peer: String,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    sender: String,
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    kind: &'static str,
    text: &'a str,
}

/// A frame pushed over the live stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamFrame {
    Message {
        sender: String,
        conversation: String,
        kind: String,
        #[serde(default)]
        text: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

// ── Connection ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct RelayConnection {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
    address: Address,
}

impl RelayConnection {
    fn conversation_handle(&self, peer: Address) -> Arc<dyn Conversation> {
        Arc::new(RelayConversation {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            peer,
        })
    }
}

#[async_trait]
impl Connection for RelayConnection {
    async fn publish_contact(&self) -> Result<()> {
        self.http
            .post(format!("{}/v1/contact", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(&ContactBundle {
                address: self.address.to_string(),
            })
            .send()
            .await
            .map_err(|error| Error::transport("publish contact", error))?
            .error_for_status()
            .map_err(|error| Error::transport("publish contact", error))?;
        Ok(())
    }

    async fn conversations(&self) -> Result<Vec<Arc<dyn Conversation>>> {
        let entries: Vec<ConversationEntry> = self
            .http
            .get(format!("{}/v1/conversations", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|error| Error::transport("list conversations", error))?
            .error_for_status()
            .map_err(|error| Error::transport("list conversations", error))?
            .json()
            .await
            .map_err(|error| Error::transport("list conversations", error))?;

        entries
            .into_iter()
            .map(|entry| Ok(self.conversation_handle(entry.peer.parse()?)))
            .collect()
    }

    async fn stream_messages(&self) -> Result<MessageStream> {
        let url = stream_url(&self.base_url, self.token.expose_secret());
        let (mut socket, _response) = connect_async(&url)
            .await
            .map_err(|error| Error::stream(error))?;
        info!("live message stream open");

        let connection = self.clone();
        let stream = async_stream::stream! {
            while let Some(frame) = socket.next().await {
                match frame {
                    Ok(Message::Text(raw)) => {
                        let frame: StreamFrame = match serde_json::from_str(raw.as_str()) {
                            Ok(frame) => frame,
                            Err(error) => {
                                yield Err(Error::stream(format!(
                                    "malformed stream frame: {error}"
                                )));
                                return;
                            },
                        };
                        match frame {
                            StreamFrame::Message { sender, conversation, kind, text } => {
                                let sender: Address = match sender.parse() {
                                    Ok(sender) => sender,
                                    Err(error) => {
                                        yield Err(Error::stream(error));
                                        return;
                                    },
                                };
                                let peer: Address = match conversation.parse() {
                                    Ok(peer) => peer,
                                    Err(error) => {
                                        yield Err(Error::stream(error));
                                        return;
                                    },
                                };
                                yield Ok(InboundMessage {
                                    sender,
                                    content: MessageContent::from_wire(kind, text),
                                    conversation: connection.conversation_handle(peer),
                                });
                            },
                            StreamFrame::Unknown => {
                                debug!("ignoring unknown stream frame");
                            },
                        }
                    },
                    Ok(Message::Close(_)) => {
                        debug!("relay closed the stream");
                        break;
                    },
                    Ok(_) => {},
                    Err(error) => {
                        yield Err(Error::stream(error));
                        return;
                    },
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

// ── Conversation ────────────────────────────────────────────────────────────

struct RelayConversation {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
    peer: Address,
}

#[async_trait]
impl Conversation for RelayConversation {
    fn peer_address(&self) -> Address {
        self.peer
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<StoredMessage>> {
        let messages: Vec<WireMessage> = self
            .http
            .get(format!(
                "{}/v1/conversations/{}/messages",
                self.base_url, self.peer
            ))
            .query(&[("limit", limit.to_string()), ("order", "desc".into())])
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|error| Error::transport("fetch messages", error))?
            .error_for_status()
            .map_err(|error| Error::transport("fetch messages", error))?
            .json()
            .await
            .map_err(|error| Error::transport("fetch messages", error))?;

        messages
            .into_iter()
            .map(|message| {
                Ok(StoredMessage {
                    sender: message.sender.parse()?,
                    content: MessageContent::from_wire(message.kind, message.text),
                })
            })
            .collect()
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.http
            .post(format!(
                "{}/v1/conversations/{}/messages",
                self.base_url, self.peer
            ))
            .bearer_auth(self.token.expose_secret())
            .json(&OutboundMessage { kind: "text", text })
            .send()
            .await
            .map_err(|error| Error::transport("send message", error))?
            .error_for_status()
            .map_err(|error| Error::transport("send message", error))?;
        Ok(())
    }
}
