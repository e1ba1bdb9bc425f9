//! Poll loop driving the invoice processor
//!
//! The worker receives a bounded batch, hands it to the processor and
//! settles the outcome: ack everything on success, nack everything on
//! failure. A failed batch is returned whole — messages that did get
//! processed before the failure are replayed too, which the processor's
//! EMITTED-only guard absorbs as no-ops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::core::processor::InvoiceProcessor;
use crate::core::queue::{QueueConsumer, QueueError};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Long-running consumer side of the work queue.
pub struct ProcessorWorker {
    queue: Arc<dyn QueueConsumer>,
    processor: Arc<InvoiceProcessor>,
    batch_size: usize,
    poll_interval: Duration,
}

impl ProcessorWorker {
    pub fn new(queue: Arc<dyn QueueConsumer>, processor: Arc<InvoiceProcessor>) -> Self {
        Self {
            queue,
            processor,
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// One receive/process/settle cycle. Returns the number of messages
    /// received, so callers can tell an idle poll from a busy one.
    pub async fn run_once(&self) -> Result<usize, QueueError> {
        let messages = self.queue.receive(self.batch_size).await?;
        if messages.is_empty() {
            return Ok(0);
        }

        match self.processor.handle_batch(&messages).await {
            Ok(()) => {
                for message in &messages {
                    self.queue.ack(message).await?;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "batch failed, returning messages for redelivery");
                for message in &messages {
                    self.queue.nack(message).await?;
                }
            }
        }
        Ok(messages.len())
    }

    /// Run until the shutdown signal flips to `true`.
    ///
    /// Receive and settle errors are transient from the loop's point of
    /// view: they are logged and followed by the poll backoff, so a
    /// flaky queue backend never kills the consumer. Only the shutdown
    /// signal exits the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                tracing::info!("processor worker stopping");
                return;
            }
            let idle = match self.run_once().await {
                Ok(received) => received == 0,
                Err(err) => {
                    tracing::warn!(error = %err, "queue poll failed, backing off");
                    true
                }
            };
            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = shutdown.changed() => {}
                }
            }
        }
    }
}
