//! Signing identity resolution.

use {
    secrecy::{ExposeSecret, SecretString, SecretVec},
    sha2::{Digest, Sha256},
};

use crate::{
    address::Address,
    error::{Error, Result},
};

/// Domain separator for relay auth token derivation.
const AUTH_TOKEN_CONTEXT: &[u8] = b"corvid-relay-auth-v1";

/// Signing identity: the credential used to authenticate against the
/// messaging network plus the receiving address derived from it.
///
/// The network's real key-to-address cryptography lives in the transport;
/// this type only holds the key material and its deterministic derivations.
pub struct Identity {
    key: SecretVec<u8>,
    address: Address,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Identity {
    /// Build an identity from a configured signing key: 64 hex characters,
    /// with or without a `0x` prefix.
    ///
    /// A malformed key is a configuration error, not a transient one.
    pub fn from_key(key: &SecretString) -> Result<Self> {
        let raw = key.expose_secret().trim();
        let raw = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes =
            hex::decode(raw).map_err(|_| Error::config("signing key is not valid hex"))?;
        if bytes.len() != 32 {
            return Err(Error::config("signing key must be 32 bytes of hex"));
        }
        Ok(Self::from_key_bytes(bytes))
    }

    /// Generate a fresh ephemeral identity.
    ///
    /// Conversations started with it cannot be recovered across restarts.
    #[must_use]
    pub fn ephemeral() -> Self {
        let bytes: [u8; 32] = rand::random();
        Self::from_key_bytes(bytes.to_vec())
    }

    fn from_key_bytes(bytes: Vec<u8>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hasher.finalize();
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[..20]);
        Self {
            key: SecretVec::new(bytes),
            address: Address::from_bytes(address),
        }
    }

    /// Address this identity receives on.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Bearer token the relay accepts for this identity.
    #[must_use]
    pub fn auth_token(&self) -> SecretString {
        let mut hasher = Sha256::new();
        hasher.update(AUTH_TOKEN_CONTEXT);
        hasher.update(self.key.expose_secret());
        SecretString::new(format!("{:x}", hasher.finalize()))
    }
}
