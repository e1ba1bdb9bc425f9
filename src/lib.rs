//! # NFS-e Issuance Service
//!
//! Emit, consult and cancel electronic service-invoice (NFS-e) records,
//! with asynchronous processing of emitted invoices through a work
//! queue.
//!
//! ## Architecture
//!
//! - **Lifecycle engine** ([`core::service::InvoiceService`] and
//!   [`core::processor::InvoiceProcessor`]): four guarded state
//!   transitions — Emit, Consult, Cancel, Process — over a
//!   conditional-write record store.
//! - **Pluggable backends**: the record store, document store and work
//!   queue are traits. In-memory implementations back tests and local
//!   development; DynamoDB, S3 and SQS implementations (feature-gated)
//!   back the deployed service.
//! - **REST exposure**: an Axum router over a [`server::ServerHost`],
//!   with permissive CORS and request tracing.
//! - **Worker**: a poll loop feeding queue batches to the processor,
//!   acking on success and relying on bounded redelivery plus a
//!   dead-letter destination on failure.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nfse::prelude::*;
//! use std::sync::Arc;
//!
//! let records = Arc::new(InMemoryRecordStore::new());
//! let documents = Arc::new(InMemoryDocumentStore::new());
//! let queue = Arc::new(InMemoryWorkQueue::new(3));
//!
//! let invoices = InvoiceService::new(records.clone(), documents)
//!     .with_dispatch(queue.clone());
//!
//! let receipt = invoices.emit(EmitRequest::default()).await?;
//! let view = invoices.consult(&receipt.invoice_id).await?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod worker;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Configuration ===
    pub use crate::config::{CancelPolicy, ConfigError, ServiceConfig};

    // === Core ===
    pub use crate::core::{
        document::{DocumentError, DocumentStore, XML_CONTENT_TYPE, render_invoice_xml, xml_key},
        error::{ErrorResponse, ServiceError, ServiceResult},
        event::{Envelope, INVOICE_ISSUED, InvoiceIssued, invoice_id_of, normalize_detail},
        invoice::{
            CancelReceipt, DEFAULT_CNPJ, EmitReceipt, EmitRequest, InvoiceRecord, InvoiceStatus,
            InvoiceView, TotalValue, new_invoice_id, now_iso,
        },
        processor::{FilingAuthority, InvoiceProcessor, NoopFilingAuthority},
        queue::{EventPublisher, QueueConsumer, QueueError, QueueMessage},
        service::InvoiceService,
        store::{RecordStore, StatusGuard, StatusTransition, StoreError},
    };

    // === Server & worker ===
    pub use crate::server::{RestExposure, ServerHost};
    pub use crate::worker::ProcessorWorker;

    // === Storage ===
    #[cfg(feature = "dynamodb")]
    pub use crate::storage::DynamoDbRecordStore;
    #[cfg(feature = "s3")]
    pub use crate::storage::S3DocumentStore;
    #[cfg(feature = "sqs")]
    pub use crate::storage::SqsWorkQueue;
    pub use crate::storage::{InMemoryDocumentStore, InMemoryRecordStore, InMemoryWorkQueue};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
}
