//! Invoice record, lifecycle status and request/response shapes
//!
//! The record is the sole entity of the service. All wire shapes use
//! camelCase field names and SCREAMING statuses (`"EMITTED"`), matching
//! what consumers of the API already expect.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Sentinel CNPJ used when the emit request carries none.
pub const DEFAULT_CNPJ: &str = "00000000000000";

/// Lifecycle status of an invoice.
///
/// Status only moves forward: EMITTED → PROCESSING → PROCESSED, with
/// CANCELLED reachable independently via the cancel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Emitted,
    Processing,
    Processed,
    Cancelled,
}

impl InvoiceStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Emitted => "EMITTED",
            InvoiceStatus::Processing => "PROCESSING",
            InvoiceStatus::Processed => "PROCESSED",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current UTC time as ISO-8601 with a literal `Z` suffix.
///
/// Timestamps are stored as strings in this format, so lexicographic
/// order equals temporal order.
pub fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Generate a new invoice identifier: 12 hex characters drawn from a
/// v4 UUID. Collisions are astronomically unlikely and the record
/// store's conditional write serializes the race if one ever happens.
pub fn new_invoice_id() -> String {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(12);
    hex
}

/// The stored invoice record.
///
/// `total` is persisted as a decimal string and only coerced to a
/// number when projected for consult responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub invoice_id: String,
    pub company_cnpj: String,
    pub status: InvoiceStatus,
    pub total: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<String>,
}

impl InvoiceRecord {
    /// Build a freshly emitted record.
    pub fn emitted(
        invoice_id: impl Into<String>,
        company_cnpj: impl Into<String>,
        total: f64,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            company_cnpj: company_cnpj.into(),
            status: InvoiceStatus::Emitted,
            total: format!("{total}"),
            created_at: created_at.into(),
            processing_at: None,
            processed_at: None,
            cancelled_at: None,
        }
    }

    /// Project the record into its external representation, coercing the
    /// stored `total` string to a number where possible.
    pub fn to_view(&self) -> InvoiceView {
        InvoiceView {
            invoice_id: self.invoice_id.clone(),
            company_cnpj: self.company_cnpj.clone(),
            status: self.status,
            total: TotalValue::from(self.total.as_str()),
            created_at: self.created_at.clone(),
            processing_at: self.processing_at.clone(),
            processed_at: self.processed_at.clone(),
            cancelled_at: self.cancelled_at.clone(),
        }
    }
}

/// Emit request body. Both fields are optional; missing values fall
/// back to the documented defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitRequest {
    pub company_cnpj: Option<String>,
    pub total: Option<f64>,
}

/// Successful emit response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitReceipt {
    pub invoice_id: String,
    pub status: InvoiceStatus,
    pub xml_key: String,
}

/// Successful cancel response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReceipt {
    pub invoice_id: String,
    pub status: InvoiceStatus,
}

/// `total` as exposed to clients: numeric when the stored decimal
/// string parses, otherwise the raw stored value unchanged. The
/// coercion is deliberately non-fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalValue {
    Number(f64),
    Raw(String),
}

impl From<&str> for TotalValue {
    fn from(stored: &str) -> Self {
        match stored.parse::<f64>() {
            Ok(number) => TotalValue::Number(number),
            Err(_) => TotalValue::Raw(stored.to_string()),
        }
    }
}

/// Consult response: the full record projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    pub invoice_id: String,
    pub company_cnpj: String,
    pub status: InvoiceStatus,
    pub total: TotalValue,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Emitted).unwrap(),
            "\"EMITTED\""
        );
        assert_eq!(InvoiceStatus::Cancelled.to_string(), "CANCELLED");
        let status: InvoiceStatus = serde_json::from_str("\"PROCESSING\"").unwrap();
        assert_eq!(status, InvoiceStatus::Processing);
    }

    #[test]
    fn test_new_invoice_id_shape() {
        let id = new_invoice_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_new_invoice_ids_are_distinct() {
        let ids: std::collections::HashSet<String> = (0..100).map(|_| new_invoice_id()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_now_iso_has_z_suffix() {
        let now = now_iso();
        assert!(now.ends_with('Z'));
        assert!(now.contains('T'));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = InvoiceRecord::emitted("abc123def456", "123", 99.5, "2026-01-01T00:00:00.000000Z");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["invoiceId"], "abc123def456");
        assert_eq!(json["companyCnpj"], "123");
        assert_eq!(json["status"], "EMITTED");
        assert_eq!(json["total"], "99.5");
        // Unset timestamps are omitted entirely
        assert!(json.get("processingAt").is_none());
        assert!(json.get("cancelledAt").is_none());
    }

    #[test]
    fn test_emit_request_tolerates_sparse_bodies() {
        let request: EmitRequest = serde_json::from_str("{}").unwrap();
        assert!(request.company_cnpj.is_none());
        assert!(request.total.is_none());

        let request: EmitRequest = serde_json::from_str(r#"{"total": 10}"#).unwrap();
        assert_eq!(request.total, Some(10.0));
    }

    #[test]
    fn test_view_coerces_numeric_total() {
        let record = InvoiceRecord::emitted("a", "b", 99.5, "t");
        assert_eq!(record.to_view().total, TotalValue::Number(99.5));
    }

    #[test]
    fn test_view_passes_raw_total_unchanged() {
        let mut record = InvoiceRecord::emitted("a", "b", 0.0, "t");
        record.total = "not-a-number".to_string();
        assert_eq!(
            record.to_view().total,
            TotalValue::Raw("not-a-number".to_string())
        );
        let json = serde_json::to_value(record.to_view()).unwrap();
        assert_eq!(json["total"], "not-a-number");
    }

    #[test]
    fn test_default_total_formats_as_zero() {
        let record = InvoiceRecord::emitted("a", DEFAULT_CNPJ, 0.0, "t");
        assert_eq!(record.total, "0");
    }
}
