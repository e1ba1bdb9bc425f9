//! Asynchronous consumer: EMITTED → PROCESSING → PROCESSED
//!
//! Messages within a batch are handled independently and in order. The
//! first failing message aborts the remainder of the batch and the
//! error propagates to the caller — never swallowed — so the queue's
//! redelivery and dead-letter mechanism stays in charge. The
//! EMITTED-only guard on the first transition is what makes redelivery
//! safe: a message that already advanced the record is a no-op.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::core::event::{invoice_id_of, normalize_detail};
use crate::core::invoice::{InvoiceStatus, now_iso};
use crate::core::queue::QueueMessage;
use crate::core::store::{RecordStore, StatusGuard, StatusTransition, StoreError};

/// Downstream filing integration invoked between the PROCESSING and
/// PROCESSED transitions.
#[async_trait]
pub trait FilingAuthority: Send + Sync {
    async fn submit(&self, invoice_id: &str) -> Result<()>;
}

/// Stand-in for the municipal filing integration; always succeeds.
pub struct NoopFilingAuthority;

#[async_trait]
impl FilingAuthority for NoopFilingAuthority {
    async fn submit(&self, _invoice_id: &str) -> Result<()> {
        Ok(())
    }
}

/// The asynchronous side of the invoice lifecycle.
pub struct InvoiceProcessor {
    records: Arc<dyn RecordStore>,
    filing: Arc<dyn FilingAuthority>,
}

impl InvoiceProcessor {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self {
            records,
            filing: Arc::new(NoopFilingAuthority),
        }
    }

    pub fn with_filing(mut self, filing: Arc<dyn FilingAuthority>) -> Self {
        self.filing = filing;
        self
    }

    /// Handle one delivery batch.
    ///
    /// An error from any message aborts the remaining messages and
    /// propagates; the caller returns the whole batch for redelivery.
    pub async fn handle_batch(&self, messages: &[QueueMessage]) -> Result<()> {
        for message in messages {
            self.handle_message(message).await?;
        }
        Ok(())
    }

    async fn handle_message(&self, message: &QueueMessage) -> Result<()> {
        let detail = normalize_detail(&message.body)?;
        let Some(invoice_id) = invoice_id_of(&detail) else {
            // Not every queue message pertains to an invoice.
            tracing::debug!("queue message without invoiceId, skipping");
            return Ok(());
        };

        let transition = StatusTransition::Processing { at: now_iso() };
        let guard = StatusGuard::ExistsWithStatus(InvoiceStatus::Emitted);
        match self.records.update_status(invoice_id, transition, guard).await {
            Ok(()) => {}
            Err(StoreError::ConditionFailed) => {
                // Redelivery after the record advanced past EMITTED is
                // harmless; a wholly missing record is a real failure.
                return match self.records.get(invoice_id).await? {
                    Some(record) => {
                        tracing::info!(
                            invoice_id,
                            status = %record.status,
                            "record already advanced, treating redelivery as a no-op"
                        );
                        Ok(())
                    }
                    None => Err(anyhow!("invoice '{invoice_id}' not found for processing")),
                };
            }
            Err(StoreError::Backend(err)) => return Err(err),
        }

        self.filing.submit(invoice_id).await?;

        self.records
            .update_status(
                invoice_id,
                StatusTransition::Processed { at: now_iso() },
                StatusGuard::None,
            )
            .await?;

        tracing::info!(invoice_id, "invoice processed");
        Ok(())
    }
}
