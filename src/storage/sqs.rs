//! SQS implementation of the work-queue contracts
//!
//! Redelivery and dead-lettering are owned by the queue itself: an
//! unacknowledged message reappears after its visibility timeout, and
//! the redrive policy moves it to the dead-letter queue once it exceeds
//! the maximum receive count. `nack` is therefore a no-op here.

use async_trait::async_trait;
use aws_sdk_sqs::Client;

use crate::core::event::{Envelope, InvoiceIssued};
use crate::core::queue::{EventPublisher, QueueConsumer, QueueError, QueueMessage};

// SQS caps a single receive at ten messages.
const MAX_RECEIVE_BATCH: usize = 10;

/// SQS work queue: dispatch publisher and consumer over one queue URL.
#[derive(Clone)]
pub struct SqsWorkQueue {
    client: Client,
    queue_url: String,
}

impl SqsWorkQueue {
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl EventPublisher for SqsWorkQueue {
    async fn publish(&self, event: &InvoiceIssued) -> Result<(), QueueError> {
        let envelope = Envelope::invoice_issued(event).map_err(anyhow::Error::from)?;
        let body = serde_json::to_string(&envelope).map_err(anyhow::Error::from)?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|err| QueueError::Backend(anyhow::Error::new(err.into_service_error())))?;
        Ok(())
    }
}

#[async_trait]
impl QueueConsumer for SqsWorkQueue {
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max.min(MAX_RECEIVE_BATCH) as i32)
            .wait_time_seconds(10)
            .send()
            .await
            .map_err(|err| QueueError::Backend(anyhow::Error::new(err.into_service_error())))?;

        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|message| {
                let receipt = message.receipt_handle?;
                let body = message.body?;
                Some(QueueMessage { receipt, body })
            })
            .collect())
    }

    async fn ack(&self, message: &QueueMessage) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.receipt)
            .send()
            .await
            .map_err(|err| QueueError::Backend(anyhow::Error::new(err.into_service_error())))?;
        Ok(())
    }

    async fn nack(&self, _message: &QueueMessage) -> Result<(), QueueError> {
        // Visibility timeout and the redrive policy govern redelivery.
        Ok(())
    }
}
