//! In-memory backends for testing and development
//!
//! `InMemoryWorkQueue` mimics the deployed queue's at-least-once
//! semantics: received messages move in flight, a nack requeues them
//! until the receive count exceeds the configured maximum, and anything
//! past that limit is dead-lettered for inspection.

use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

use crate::core::document::{DocumentError, DocumentStore};
use crate::core::event::{Envelope, InvoiceIssued};
use crate::core::invoice::InvoiceRecord;
use crate::core::queue::{EventPublisher, QueueConsumer, QueueError, QueueMessage};
use crate::core::store::{RecordStore, StatusGuard, StatusTransition, StoreError};

/// In-memory record store. Uses RwLock for thread-safe access.
///
/// A status update never materializes a record: an absent key fails the
/// write even under an unconditional guard.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<String, InvoiceRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, invoice_id: &str) -> Result<Option<InvoiceRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(records.get(invoice_id).cloned())
    }

    async fn put_new(&self, record: InvoiceRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if records.contains_key(&record.invoice_id) {
            return Err(StoreError::ConditionFailed);
        }
        records.insert(record.invoice_id.clone(), record);
        Ok(())
    }

    async fn update_status(
        &self,
        invoice_id: &str,
        transition: StatusTransition,
        guard: StatusGuard,
    ) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if !guard.permits(records.get(invoice_id)) {
            return Err(StoreError::ConditionFailed);
        }
        let Some(record) = records.get_mut(invoice_id) else {
            return Err(StoreError::ConditionFailed);
        };
        transition.apply(record);
        Ok(())
    }
}

#[derive(Clone)]
struct StoredDocument {
    body: Vec<u8>,
    content_type: String,
}

/// In-memory document store.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    objects: Arc<RwLock<HashMap<String, StoredDocument>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded for a stored document, if present.
    pub fn content_type_of(&self, key: &str) -> Option<String> {
        let objects = self.objects.read().ok()?;
        objects.get(key).map(|doc| doc.content_type.clone())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), DocumentError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        objects.insert(
            key.to_string(),
            StoredDocument {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DocumentError> {
        let objects = self
            .objects
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(objects.get(key).map(|doc| doc.body.clone()))
    }
}

#[derive(Clone)]
struct PendingMessage {
    receipt: String,
    body: String,
    receive_count: u32,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<PendingMessage>,
    inflight: HashMap<String, PendingMessage>,
    dead: Vec<PendingMessage>,
}

/// In-memory work queue with bounded redelivery and a dead-letter
/// destination. Serves as both the dispatch publisher and the consumer
/// side for the worker.
#[derive(Clone)]
pub struct InMemoryWorkQueue {
    state: Arc<Mutex<QueueState>>,
    max_receive_count: u32,
}

impl InMemoryWorkQueue {
    pub fn new(max_receive_count: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            max_receive_count,
        }
    }

    /// Push a raw message body, bypassing the envelope. Tests use this
    /// to simulate foreign or malformed producers.
    pub fn push_raw(&self, body: impl Into<String>) {
        let mut state = self.state.lock().expect("queue lock poisoned");
        state.pending.push_back(PendingMessage {
            receipt: Uuid::new_v4().to_string(),
            body: body.into(),
            receive_count: 0,
        });
    }

    /// Number of messages waiting for delivery.
    pub fn pending_len(&self) -> usize {
        self.state.lock().expect("queue lock poisoned").pending.len()
    }

    /// Bodies currently parked in the dead-letter destination.
    pub fn dead_letter_bodies(&self) -> Vec<String> {
        let state = self.state.lock().expect("queue lock poisoned");
        state.dead.iter().map(|m| m.body.clone()).collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryWorkQueue {
    async fn publish(&self, event: &InvoiceIssued) -> Result<(), QueueError> {
        let envelope = Envelope::invoice_issued(event).map_err(anyhow::Error::from)?;
        let body = serde_json::to_string(&envelope).map_err(anyhow::Error::from)?;

        let mut state = self
            .state
            .lock()
            .map_err(|e| anyhow!("Failed to acquire queue lock: {}", e))?;
        state.pending.push_back(PendingMessage {
            receipt: Uuid::new_v4().to_string(),
            body,
            receive_count: 0,
        });
        Ok(())
    }
}

#[async_trait]
impl QueueConsumer for InMemoryWorkQueue {
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>, QueueError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| anyhow!("Failed to acquire queue lock: {}", e))?;

        let mut received = Vec::new();
        while received.len() < max {
            let Some(mut message) = state.pending.pop_front() else {
                break;
            };
            message.receive_count += 1;
            received.push(QueueMessage {
                receipt: message.receipt.clone(),
                body: message.body.clone(),
            });
            state.inflight.insert(message.receipt.clone(), message);
        }
        Ok(received)
    }

    async fn ack(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| anyhow!("Failed to acquire queue lock: {}", e))?;
        state.inflight.remove(&message.receipt);
        Ok(())
    }

    async fn nack(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| anyhow!("Failed to acquire queue lock: {}", e))?;

        let Some(pending) = state.inflight.remove(&message.receipt) else {
            return Ok(());
        };
        if pending.receive_count >= self.max_receive_count {
            tracing::warn!(
                receive_count = pending.receive_count,
                "message exceeded max deliveries, dead-lettering"
            );
            state.dead.push(pending);
        } else {
            state.pending.push_back(pending);
        }
        Ok(())
    }
}
