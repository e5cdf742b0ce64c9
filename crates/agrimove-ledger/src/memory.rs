use std::collections::HashMap;
use std::sync::Arc;

use agrimove_core::{NewTransportRequest, Result, TransportLedger, TransportRequest};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Default)]
struct LedgerState {
    last_sequence: u64,
    records: Vec<TransportRequest>,
    index: HashMap<String, usize>,
}

/// Append-only transport request ledger held in process memory.
///
/// Nothing is persisted: every record is lost when the process exits.
/// Identifier assignment and insertion happen under one write lock, so
/// concurrent appends get distinct, increasing `REQ-<n>` identifiers.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransportLedger for InMemoryLedger {
    async fn append(&self, request: NewTransportRequest) -> Result<TransportRequest> {
        request.validate()?;

        let mut state = self.state.write().await;
        state.last_sequence += 1;
        let record = TransportRequest::from_submission(state.last_sequence, request, Utc::now());
        let position = state.records.len();
        state.index.insert(record.request_id.clone(), position);
        state.records.push(record.clone());
        info!(
            request_id = %record.request_id,
            produce = %record.produce,
            quantity = record.quantity,
            "transport request recorded"
        );
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<TransportRequest>> {
        let state = self.state.read().await;
        Ok(state.records.clone())
    }

    async fn get(&self, request_id: &str) -> Result<Option<TransportRequest>> {
        let state = self.state.read().await;
        Ok(state
            .index
            .get(request_id)
            .and_then(|&position| state.records.get(position))
            .cloned())
    }

    async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrimove_core::{Error, RequestStatus};

    fn wheat() -> NewTransportRequest {
        NewTransportRequest {
            farmer_name: "John".into(),
            produce: "Wheat".into(),
            quantity: 50,
            pickup: "A".into(),
            destination: "B".into(),
        }
    }

    #[tokio::test]
    async fn test_append_list_get() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.is_empty().await);

        let first = ledger.append(wheat()).await.unwrap();
        assert_eq!(first.request_id, "REQ-1");
        assert_eq!(first.status, RequestStatus::Pending);
        assert_eq!(first.quantity, 50);

        let second = ledger.append(wheat()).await.unwrap();
        assert_eq!(second.request_id, "REQ-2");
        assert!(second.created_at >= first.created_at);

        let all = ledger.list().await.unwrap();
        assert_eq!(all, vec![first.clone(), second]);

        assert_eq!(ledger.get("REQ-1").await.unwrap(), Some(first));
        assert!(ledger.get("REQ-999").await.unwrap().is_none());
        assert!(ledger.get("req-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_submission_leaves_ledger_untouched() {
        let ledger = InMemoryLedger::new();
        ledger.append(wheat()).await.unwrap();

        for quantity in [0, -1, i64::MIN] {
            let request = NewTransportRequest {
                quantity,
                ..wheat()
            };
            let err = ledger.append(request).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
            assert_eq!(ledger.len().await, 1);
        }

        let next = ledger.append(wheat()).await.unwrap();
        assert_eq!(next.request_id, "REQ-2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_get_unique_increasing_ids() {
        let ledger = InMemoryLedger::new();
        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    let request = NewTransportRequest {
                        quantity: i + 1,
                        ..wheat()
                    };
                    ledger.append(request).await.unwrap()
                })
            })
            .collect();
        let results = futures::future::join_all(tasks).await;
        assert!(results.iter().all(|r| r.is_ok()));

        let records = ledger.list().await.unwrap();
        assert_eq!(records.len(), 64);
        for (position, record) in records.iter().enumerate() {
            assert_eq!(record.request_id, format!("REQ-{}", position + 1));
        }

        let mut quantities: Vec<u64> = records.iter().map(|r| r.quantity).collect();
        quantities.sort_unstable();
        assert_eq!(quantities, (1..=64).collect::<Vec<u64>>());
    }
}
