//! Work queue contracts: event publishing and at-least-once consumption
//!
//! The queue delivers messages at least once. A message that is not
//! acknowledged comes back; a message returned more times than the
//! configured maximum is routed to the dead-letter destination for
//! manual inspection.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::event::InvoiceIssued;

/// Errors surfaced by a queue backend.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("work queue backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// A received queue message. `receipt` identifies this delivery for
/// ack/nack settlement.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub receipt: String,
    pub body: String,
}

/// Publishing side of the dispatch workflow: forwards an emit event
/// into the work queue for asynchronous processing.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &InvoiceIssued) -> Result<(), QueueError>;
}

/// Consuming side of the work queue.
#[async_trait]
pub trait QueueConsumer: Send + Sync {
    /// Receive up to `max` messages. May return fewer, or none.
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>, QueueError>;

    /// Settle a message as handled; it will not be redelivered.
    async fn ack(&self, message: &QueueMessage) -> Result<(), QueueError>;

    /// Return a message for redelivery. Backends that redeliver via a
    /// visibility timeout may treat this as a no-op.
    async fn nack(&self, message: &QueueMessage) -> Result<(), QueueError>;
}
