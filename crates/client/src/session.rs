//! Session establishment against the messaging network.

use std::sync::Arc;

use {secrecy::SecretString, tracing::info};

use crate::{
    address::Address,
    error::{Error, Result},
    identity::Identity,
    transport::{Connection, Transport},
};

/// Deployment environment of the messaging backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEnv {
    Production,
    Dev,
}

impl NetworkEnv {
    /// Parse the raw environment tag. Anything outside the fixed allowed
    /// set is a fatal configuration error.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "production" => Ok(Self::Production),
            "dev" => Ok(Self::Dev),
            other => Err(Error::config(format!(
                "invalid network environment {other:?} (expected \"production\" or \"dev\")"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Dev => "dev",
        }
    }
}

/// Settings for establishing a session.
#[derive(Clone)]
pub struct SessionConfig {
    /// Hex-encoded signing key. `None` generates an ephemeral identity on
    /// each connect.
    pub signing_key: Option<SecretString>,
    /// Raw environment tag, validated during connect so that a bad value
    /// surfaces as a non-retryable configuration error.
    pub env: String,
}

/// Live authenticated session: the connection handle plus the receiving
/// address derived from the identity.
///
/// Cloning shares the underlying connection; the supervisor owns the one
/// logical session per cycle.
#[derive(Clone)]
pub struct Session {
    connection: Arc<dyn Connection>,
    address: Address,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Resolve the signing identity, connect the transport, and publish the
    /// identity's contact information so peers can reach it.
    pub async fn connect(transport: &dyn Transport, config: &SessionConfig) -> Result<Self> {
        let env = NetworkEnv::parse(&config.env)?;
        let identity = match &config.signing_key {
            Some(key) => Identity::from_key(key)?,
            None => {
                info!("no signing key configured, generating an ephemeral identity");
                Identity::ephemeral()
            },
        };

        let connection = transport.connect(&identity, env).await?;
        connection
            .publish_contact()
            .await
            .map_err(|error| Error::connection(error))?;

        info!(address = %identity.address(), env = env.as_str(), "session established");
        Ok(Self {
            connection,
            address: identity.address(),
        })
    }

    /// Address this session receives on.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Live connection handle.
    #[must_use]
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }
}
