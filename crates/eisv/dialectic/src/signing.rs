//! Message signatures and resolution content hashes.
//!
//! A signature is a BLAKE3 keyed hash of the canonical message bytes, keyed
//! by a key derived from the sender's secret. Secrets never leave the
//! [`KeyRing`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

const SIGNING_CONTEXT: &str = "eisv-dialectic 2024 message signature v1";

/// Source of per-agent signing secrets.
pub trait KeyRing: Send + Sync {
    fn secret(&self, agent_id: &str) -> Option<Vec<u8>>;
}

/// Key ring backed by a plain map. For tests and single-process hosts.
#[derive(Clone, Default)]
pub struct InMemoryKeyRing {
    secrets: HashMap<String, Vec<u8>>,
}

impl InMemoryKeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, agent_id: impl Into<String>, secret: impl Into<Vec<u8>>) {
        self.secrets.insert(agent_id.into(), secret.into());
    }

    pub fn with(mut self, agent_id: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        self.insert(agent_id, secret);
        self
    }
}

impl fmt::Debug for InMemoryKeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryKeyRing")
            .field("agents", &self.secrets.len())
            .finish()
    }
}

impl KeyRing for InMemoryKeyRing {
    fn secret(&self, agent_id: &str) -> Option<Vec<u8>> {
        self.secrets.get(agent_id).cloned()
    }
}

/// Sign canonical bytes, returning the lowercase hex signature.
pub fn sign(secret: &[u8], canonical: &[u8]) -> String {
    let key = blake3::derive_key(SIGNING_CONTEXT, secret);
    blake3::keyed_hash(&key, canonical).to_hex().to_string()
}

/// Check a hex signature. Malformed hex is simply invalid.
pub fn verify(secret: &[u8], canonical: &[u8], signature: &str) -> bool {
    let Ok(claimed) = blake3::Hash::from_hex(signature) else {
        return false;
    };
    let key = blake3::derive_key(SIGNING_CONTEXT, secret);
    // blake3::Hash equality is constant-time.
    blake3::keyed_hash(&key, canonical) == claimed
}

/// Hex digits shown by `Display`.
const SHORT_HEX: usize = 12;

/// BLAKE3 digest of a resolution's canonical bytes.
///
/// Travels as the full hex string and displays shortened.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
    pub fn hash(data: &[u8]) -> Self {
        Self(blake3::hash(data))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl TryFrom<String> for ContentHash {
    type Error = blake3::HexError;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        blake3::Hash::from_hex(hex).map(Self)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_hex()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex()[..SHORT_HEX])
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentHash").field(&self.to_string()).finish()
    }
}
