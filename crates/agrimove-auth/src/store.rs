use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use agrimove_core::{CredentialStore, Error, Identity, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local credential store. Each instance is independent, so tests
/// and servers never share users by accident.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    users: Arc<RwLock<HashMap<String, Identity>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, username: &str) -> Result<Option<Identity>> {
        let users = self.users.read().await;
        Ok(users.get(username).cloned())
    }

    async fn register(&self, identity: Identity) -> Result<()> {
        let mut users = self.users.write().await;
        match users.entry(identity.username.clone()) {
            Entry::Occupied(_) => Err(Error::UsernameTaken(identity.username)),
            Entry::Vacant(slot) => {
                debug!(username = %identity.username, "identity stored");
                slot.insert(identity);
                Ok(())
            }
        }
    }

    async fn list(&self) -> Result<Vec<Identity>> {
        let users = self.users.read().await;
        let mut identities: Vec<Identity> = users.values().cloned().collect();
        identities.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(identities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_credential_store() {
        let store = InMemoryCredentialStore::new();
        assert!(store.lookup("farmer1").await.unwrap().is_none());

        let identity = Identity::new("farmer1", "hash")
            .with_full_name("John Farmer")
            .with_email("farmer1@example.com");
        store.register(identity.clone()).await.unwrap();

        let found = store.lookup("farmer1").await.unwrap().unwrap();
        assert_eq!(found, identity);
        assert!(!found.disabled);

        let duplicate = store.register(Identity::new("farmer1", "other")).await;
        assert!(matches!(duplicate, Err(Error::UsernameTaken(ref u)) if u == "farmer1"));
        assert_eq!(
            store.lookup("farmer1").await.unwrap().unwrap().password_hash,
            "hash"
        );

        store.register(Identity::new("agent", "hash")).await.unwrap();
        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.username)
            .collect();
        assert_eq!(names, vec!["agent", "farmer1"]);
    }

    #[tokio::test]
    async fn test_instances_are_isolated() {
        let first = InMemoryCredentialStore::new();
        let second = InMemoryCredentialStore::new();
        first.register(Identity::new("farmer1", "hash")).await.unwrap();
        assert!(second.lookup("farmer1").await.unwrap().is_none());

        let shared = first.clone();
        assert!(shared.lookup("farmer1").await.unwrap().is_some());
    }
}
