//! Invoice lifecycle engine: emit, consult and cancel
//!
//! Each operation is a stateless guarded transition against the record
//! store. Collaborators are injected once at process start and shared
//! across invocations; there is no in-process mutable state.

use std::sync::Arc;

use crate::config::CancelPolicy;
use crate::core::document::{DocumentStore, XML_CONTENT_TYPE, render_invoice_xml, xml_key};
use crate::core::error::{ServiceError, ServiceResult};
use crate::core::event::InvoiceIssued;
use crate::core::invoice::{
    CancelReceipt, DEFAULT_CNPJ, EmitReceipt, EmitRequest, InvoiceRecord, InvoiceStatus,
    InvoiceView, new_invoice_id, now_iso,
};
use crate::core::queue::EventPublisher;
use crate::core::store::{RecordStore, StatusGuard, StatusTransition, StoreError};

/// The synchronous side of the invoice lifecycle.
pub struct InvoiceService {
    records: Arc<dyn RecordStore>,
    documents: Arc<dyn DocumentStore>,
    dispatch: Option<Arc<dyn EventPublisher>>,
    cancel_policy: CancelPolicy,
}

impl InvoiceService {
    pub fn new(records: Arc<dyn RecordStore>, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            records,
            documents,
            dispatch: None,
            cancel_policy: CancelPolicy::default(),
        }
    }

    /// Enable asynchronous dispatch of emit events.
    pub fn with_dispatch(mut self, dispatch: Arc<dyn EventPublisher>) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn with_cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.cancel_policy = policy;
        self
    }

    /// Emit a new invoice: create the record, store the XML artifact
    /// and, when dispatch is configured, publish the issued event.
    pub async fn emit(&self, request: EmitRequest) -> ServiceResult<EmitReceipt> {
        let invoice_id = new_invoice_id();
        let now = now_iso();
        let company_cnpj = request
            .company_cnpj
            .unwrap_or_else(|| DEFAULT_CNPJ.to_string());
        let total = request.total.unwrap_or(0.0);

        let record = InvoiceRecord::emitted(&invoice_id, &company_cnpj, total, &now);
        match self.records.put_new(record).await {
            Ok(()) => {}
            Err(StoreError::ConditionFailed) => {
                // The generated identifier already exists; the store
                // serialized the race and we lost.
                return Err(ServiceError::Conflict { invoice_id });
            }
            Err(StoreError::Backend(err)) => return Err(ServiceError::internal(err)),
        }

        let key = xml_key(&invoice_id);
        let xml = render_invoice_xml(&invoice_id, InvoiceStatus::Emitted, &now);
        self.documents
            .put(&key, xml.into_bytes(), XML_CONTENT_TYPE)
            .await?;

        if let Some(dispatch) = &self.dispatch {
            // The record is already durable. A dispatch failure must
            // surface as a server error because downstream processing
            // depends on it, but nothing is rolled back.
            let event = InvoiceIssued {
                invoice_id: invoice_id.clone(),
                company_cnpj,
                total,
                status: InvoiceStatus::Emitted,
                xml_key: key.clone(),
                created_at: now,
            };
            dispatch.publish(&event).await?;
        }

        tracing::info!(invoice_id, "invoice emitted");
        Ok(EmitReceipt {
            invoice_id,
            status: InvoiceStatus::Emitted,
            xml_key: key,
        })
    }

    /// Consult an invoice by identifier.
    pub async fn consult(&self, invoice_id: &str) -> ServiceResult<InvoiceView> {
        let invoice_id = require_id(invoice_id)?;
        let record = self
            .records
            .get(invoice_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(invoice_id))?;
        Ok(record.to_view())
    }

    /// Cancel an invoice.
    ///
    /// Under the default policy the only precondition is that the
    /// record exists, so cancellation is idempotent and permitted from
    /// any status. Under `RefuseTerminal` a PROCESSED or CANCELLED
    /// record is refused with a conflict.
    pub async fn cancel(&self, invoice_id: &str) -> ServiceResult<CancelReceipt> {
        let invoice_id = require_id(invoice_id)?;
        let guard = match self.cancel_policy {
            CancelPolicy::AnyStatus => StatusGuard::Exists,
            CancelPolicy::RefuseTerminal => StatusGuard::ExistsOutside(vec![
                InvoiceStatus::Processed,
                InvoiceStatus::Cancelled,
            ]),
        };
        let transition = StatusTransition::Cancelled { at: now_iso() };

        match self.records.update_status(invoice_id, transition, guard).await {
            Ok(()) => {
                tracing::info!(invoice_id, "invoice cancelled");
                Ok(CancelReceipt {
                    invoice_id: invoice_id.to_string(),
                    status: InvoiceStatus::Cancelled,
                })
            }
            Err(StoreError::ConditionFailed) => {
                // Either the record is absent or the strict policy
                // refused a terminal status; tell them apart.
                match self.records.get(invoice_id).await? {
                    Some(_) => Err(ServiceError::Conflict {
                        invoice_id: invoice_id.to_string(),
                    }),
                    None => Err(ServiceError::not_found(invoice_id)),
                }
            }
            Err(StoreError::Backend(err)) => Err(ServiceError::internal(err)),
        }
    }
}

fn require_id(invoice_id: &str) -> ServiceResult<&str> {
    if invoice_id.trim().is_empty() {
        return Err(ServiceError::bad_request("Missing id"));
    }
    Ok(invoice_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryDocumentStore, InMemoryRecordStore};

    fn service() -> InvoiceService {
        InvoiceService::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryDocumentStore::new()),
        )
    }

    #[tokio::test]
    async fn test_blank_id_is_bad_request() {
        let service = service();
        assert!(matches!(
            service.consult("  ").await,
            Err(ServiceError::BadRequest { .. })
        ));
        assert!(matches!(
            service.cancel("").await,
            Err(ServiceError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_emit_without_dispatch_succeeds() {
        let service = service();
        let receipt = service.emit(EmitRequest::default()).await.unwrap();
        assert_eq!(receipt.status, InvoiceStatus::Emitted);
        assert_eq!(receipt.xml_key, format!("xml/{}.xml", receipt.invoice_id));
    }
}
