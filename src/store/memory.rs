//! In-memory credential store

use crate::store::{Credential, CredentialStore, StoreError};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// DashMap-backed credential store.
///
/// Uniqueness is enforced through the map's entry API, so concurrent
/// registrations on the same email resolve to one winner.
#[derive(Default)]
pub struct MemoryStore {
    credentials: DashMap<String, Credential>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn lookup_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials.get(email).map(|r| r.clone()))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.credentials.contains_key(email))
    }

    async fn save(&self, credential: Credential) -> Result<(), StoreError> {
        match self.credentials.entry(credential.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail(credential.email)),
            Entry::Vacant(slot) => {
                slot.insert(credential);
                Ok(())
            }
        }
    }
}
