//! Dispatch event shape and queue-envelope normalization
//!
//! The dispatch workflow relays an emit event into the work queue as
//! `{"type": "InvoiceIssued", "detail": {...}}`, but historically some
//! producers pushed the detail fields at the top level. Consumers accept
//! both shapes through a single normalization step.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::invoice::InvoiceStatus;

/// Event type tag carried by the dispatch envelope.
pub const INVOICE_ISSUED: &str = "InvoiceIssued";

/// Event published when an invoice has been emitted and its record is
/// durable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceIssued {
    pub invoice_id: String,
    pub company_cnpj: String,
    pub total: f64,
    pub status: InvoiceStatus,
    pub xml_key: String,
    pub created_at: String,
}

/// Queue envelope wrapping an event detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub detail: Value,
}

impl Envelope {
    /// Wrap an `InvoiceIssued` event for publication.
    pub fn invoice_issued(event: &InvoiceIssued) -> serde_json::Result<Self> {
        Ok(Self {
            event_type: INVOICE_ISSUED.to_string(),
            detail: serde_json::to_value(event)?,
        })
    }
}

/// Normalize a raw queue-message body into the canonical detail object.
///
/// Accepts both `{type, detail: {...}}` and the detail fields flattened
/// at the top level.
pub fn normalize_detail(body: &str) -> serde_json::Result<Value> {
    let value: Value = serde_json::from_str(body)?;
    match value.get("detail") {
        Some(detail) if detail.is_object() => Ok(detail.clone()),
        _ => Ok(value),
    }
}

/// Extract the invoice identifier from a normalized detail object.
///
/// Not every queue message pertains to an invoice; callers skip
/// messages without one.
pub fn invoice_id_of(detail: &Value) -> Option<&str> {
    detail.get("invoiceId").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_round_trip() {
        let event = InvoiceIssued {
            invoice_id: "abc123def456".to_string(),
            company_cnpj: "123".to_string(),
            total: 99.5,
            status: InvoiceStatus::Emitted,
            xml_key: "xml/abc123def456.xml".to_string(),
            created_at: "2026-01-01T00:00:00.000000Z".to_string(),
        };
        let envelope = Envelope::invoice_issued(&event).unwrap();
        assert_eq!(envelope.event_type, INVOICE_ISSUED);

        let body = serde_json::to_string(&envelope).unwrap();
        let detail = normalize_detail(&body).unwrap();
        assert_eq!(invoice_id_of(&detail), Some("abc123def456"));
        assert_eq!(detail["status"], "EMITTED");
        assert_eq!(detail["total"], 99.5);
    }

    #[test]
    fn test_normalize_accepts_flattened_shape() {
        let body = json!({"invoiceId": "abc", "total": 10}).to_string();
        let detail = normalize_detail(&body).unwrap();
        assert_eq!(invoice_id_of(&detail), Some("abc"));
    }

    #[test]
    fn test_normalize_ignores_non_object_detail() {
        let body = json!({"detail": "nope", "invoiceId": "abc"}).to_string();
        let detail = normalize_detail(&body).unwrap();
        assert_eq!(invoice_id_of(&detail), Some("abc"));
    }

    #[test]
    fn test_missing_invoice_id_is_none() {
        let detail = normalize_detail(r#"{"type":"Other","detail":{}}"#).unwrap();
        assert_eq!(invoice_id_of(&detail), None);
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        assert!(normalize_detail("not json").is_err());
    }
}
