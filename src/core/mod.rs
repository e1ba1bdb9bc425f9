//! Core module containing the invoice lifecycle engine and its contracts

pub mod document;
pub mod error;
pub mod event;
pub mod invoice;
pub mod processor;
pub mod queue;
pub mod service;
pub mod store;

pub use document::{DocumentError, DocumentStore, XML_CONTENT_TYPE, render_invoice_xml, xml_key};
pub use error::{ErrorResponse, ServiceError, ServiceResult};
pub use event::{Envelope, INVOICE_ISSUED, InvoiceIssued, invoice_id_of, normalize_detail};
pub use invoice::{
    CancelReceipt, DEFAULT_CNPJ, EmitReceipt, EmitRequest, InvoiceRecord, InvoiceStatus,
    InvoiceView, TotalValue, new_invoice_id, now_iso,
};
pub use processor::{FilingAuthority, InvoiceProcessor, NoopFilingAuthority};
pub use queue::{EventPublisher, QueueConsumer, QueueError, QueueMessage};
pub use service::InvoiceService;
pub use store::{RecordStore, StatusGuard, StatusTransition, StoreError};
