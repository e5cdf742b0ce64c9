use async_trait::async_trait;

use crate::error::Result;
use crate::types::*;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn lookup(&self, username: &str) -> Result<Option<Identity>>;
    async fn register(&self, identity: Identity) -> Result<()>;
    async fn list(&self) -> Result<Vec<Identity>>;
}

#[async_trait]
pub trait TransportLedger: Send + Sync {
    async fn append(&self, request: NewTransportRequest) -> Result<TransportRequest>;
    async fn list(&self) -> Result<Vec<TransportRequest>>;
    async fn get(&self, request_id: &str) -> Result<Option<TransportRequest>>;
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
