//! Access key lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// A registered access key: its secret and the user it belongs to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey {
    /// HMAC signing secret.
    pub secret: String,
    /// Owning user.
    pub user_id: String,
    /// Role names granted to the user.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKey")
            .field("secret", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("roles", &self.roles)
            .finish()
    }
}

/// Resolves an access key id to its key.
///
/// Implementations may be backed by a database or a remote service.
/// `Ok(None)` means the id is unknown; `Err` means the lookup itself failed.
#[async_trait::async_trait]
pub trait KeyLookup: Send + Sync {
    /// Fetch the key registered under `access_key_id`.
    async fn lookup(&self, access_key_id: &str) -> Result<Option<AccessKey>, AuthError>;
}

/// In-memory [`KeyLookup`] backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, AccessKey>>,
}

impl MemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_key(self, access_key_id: impl Into<String>, key: AccessKey) -> Self {
        self.insert(access_key_id, key);
        self
    }

    /// Register or replace a key.
    pub fn insert(&self, access_key_id: impl Into<String>, key: AccessKey) {
        self.keys
            .write()
            .expect("lock poisoned")
            .insert(access_key_id.into(), key);
    }

    /// Remove a key. Returns whether it existed.
    pub fn remove(&self, access_key_id: &str) -> bool {
        self.keys
            .write()
            .expect("lock poisoned")
            .remove(access_key_id)
            .is_some()
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.read().expect("lock poisoned").len()
    }

    /// Whether no keys are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(String, AccessKey)> for MemoryKeyStore {
    fn from_iter<I: IntoIterator<Item = (String, AccessKey)>>(iter: I) -> Self {
        Self {
            keys: RwLock::new(iter.into_iter().collect()),
        }
    }
}

#[async_trait::async_trait]
impl KeyLookup for MemoryKeyStore {
    async fn lookup(&self, access_key_id: &str) -> Result<Option<AccessKey>, AuthError> {
        Ok(self
            .keys
            .read()
            .expect("lock poisoned")
            .get(access_key_id)
            .cloned())
    }
}
