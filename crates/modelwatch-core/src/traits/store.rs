//! Durable token storage.

use std::sync::{Arc, Mutex};

use crate::error::StorageError;
use crate::tokens::AccessToken;

/// A durable key-value slot holding the bearer credential.
///
/// Implementations are synchronous and idempotent. No retries are
/// attempted: a failed write is a hard failure of the operation that
/// triggered it.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, if any.
    fn load(&self) -> Result<Option<AccessToken>, StorageError>;

    /// Persist the token, replacing any previous value.
    fn save(&self, token: &AccessToken) -> Result<(), StorageError>;

    /// Delete the persisted token. Deleting an absent token is not an error.
    fn clear(&self) -> Result<(), StorageError>;
}

impl<S: TokenStore + ?Sized> TokenStore for Arc<S> {
    fn load(&self) -> Result<Option<AccessToken>, StorageError> {
        (**self).load()
    }

    fn save(&self, token: &AccessToken) -> Result<(), StorageError> {
        (**self).save(token)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

/// In-process token store for tests and embedders without a durable slot.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<AccessToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<AccessToken>, StorageError> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn save(&self, token: &AccessToken) -> Result<(), StorageError> {
        *self.slot.lock().unwrap() = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}
