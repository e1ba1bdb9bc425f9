//! Document store contract and XML artifact rendering
//!
//! Generated documents live in a blob store keyed by invoice identifier
//! under the fixed layout `xml/{invoiceId}.xml`.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::invoice::InvoiceStatus;

/// Content type of the stored XML artifacts.
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Deterministic object key for an invoice's XML artifact.
pub fn xml_key(invoice_id: &str) -> String {
    format!("xml/{invoice_id}.xml")
}

/// Render the placeholder NFS-e envelope.
///
/// Compliant tax-authority XML is out of scope; this is a minimal
/// envelope carrying the identifier, status and emission timestamp.
pub fn render_invoice_xml(invoice_id: &str, status: InvoiceStatus, created_at: &str) -> String {
    format!("<NFS-e><Id>{invoice_id}</Id><Status>{status}</Status><Date>{created_at}</Date></NFS-e>")
}

/// Errors surfaced by a document store backend.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Blob store for generated documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a document under the given key.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), DocumentError>;

    /// Fetch a document by key, if present.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DocumentError>;
}
