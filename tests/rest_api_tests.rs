//! REST API tests exercising the full router over in-memory backends.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{Value, json};

use async_trait::async_trait;
use nfse::config::ServiceConfig;
use nfse::core::document::{DocumentError, DocumentStore};
use nfse::core::event::InvoiceIssued;
use nfse::core::invoice::{CancelReceipt, EmitReceipt, InvoiceStatus};
use nfse::core::queue::{EventPublisher, QueueError};
use nfse::core::service::InvoiceService;
use nfse::server::{RestExposure, ServerHost};
use nfse::storage::{InMemoryDocumentStore, InMemoryRecordStore, InMemoryWorkQueue};

fn server() -> TestServer {
    let invoices = InvoiceService::new(
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(InMemoryDocumentStore::new()),
    )
    .with_dispatch(Arc::new(InMemoryWorkQueue::new(3)));
    server_with(invoices)
}

fn server_with(invoices: InvoiceService) -> TestServer {
    let host = Arc::new(ServerHost::new(ServiceConfig::default(), invoices));
    TestServer::new(RestExposure::build_router(host))
}

#[tokio::test]
async fn test_ping() {
    let server = server();
    let response = server.get("/public/ping").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "ok": true }));
}

#[tokio::test]
async fn test_emit_returns_created_receipt() {
    let server = server();
    let response = server
        .post("/invoices")
        .json(&json!({ "companyCnpj": "123", "total": 99.5 }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let receipt: EmitReceipt = response.json();
    assert_eq!(receipt.invoice_id.len(), 12);
    assert_eq!(receipt.status, InvoiceStatus::Emitted);
    assert_eq!(receipt.xml_key, format!("xml/{}.xml", receipt.invoice_id));
}

#[tokio::test]
async fn test_emit_with_empty_body_uses_defaults() {
    let server = server();
    let response = server.post("/invoices").await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let receipt: EmitReceipt = response.json();
    let view: Value = server
        .get(&format!("/invoices/{}", receipt.invoice_id))
        .await
        .json();
    assert_eq!(view["companyCnpj"], "00000000000000");
    assert_eq!(view["total"], 0.0);
}

#[tokio::test]
async fn test_emit_with_non_utf8_body_uses_defaults() {
    let server = server();
    let response = server
        .post("/invoices")
        .bytes(vec![0xff, 0xfe, 0xfd].into())
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let receipt: EmitReceipt = response.json();
    assert_eq!(receipt.status, InvoiceStatus::Emitted);
}

#[tokio::test]
async fn test_emit_with_malformed_body_uses_defaults() {
    let server = server();
    let response = server
        .post("/invoices")
        .content_type("application/json")
        .text("this is not json")
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let receipt: EmitReceipt = response.json();
    assert_eq!(receipt.status, InvoiceStatus::Emitted);
}

#[tokio::test]
async fn test_consult_round_trip() {
    let server = server();
    let receipt: EmitReceipt = server
        .post("/invoices")
        .json(&json!({ "companyCnpj": "123", "total": 99.5 }))
        .await
        .json();

    let response = server.get(&format!("/invoices/{}", receipt.invoice_id)).await;
    response.assert_status_ok();
    let view: Value = response.json();
    assert_eq!(view["invoiceId"], receipt.invoice_id.as_str());
    assert_eq!(view["companyCnpj"], "123");
    assert_eq!(view["total"], 99.5);
    assert_eq!(view["status"], "EMITTED");
    assert!(view.get("cancelledAt").is_none());
}

#[tokio::test]
async fn test_consult_unknown_id_is_404() {
    let server = server();
    let response = server.get("/invoices/nosuchinvoice").await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(body["message"].as_str().unwrap().contains("nosuchinvoice"));
}

#[tokio::test]
async fn test_cancel_marks_the_invoice_cancelled() {
    let server = server();
    let receipt: EmitReceipt = server.post("/invoices").await.json();

    let response = server
        .post(&format!("/invoices/{}/cancel", receipt.invoice_id))
        .await;
    response.assert_status_ok();
    let cancel: CancelReceipt = response.json();
    assert_eq!(cancel.invoice_id, receipt.invoice_id);
    assert_eq!(cancel.status, InvoiceStatus::Cancelled);

    let view: Value = server
        .get(&format!("/invoices/{}", receipt.invoice_id))
        .await
        .json();
    assert_eq!(view["status"], "CANCELLED");
    assert!(view["cancelledAt"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_cancel_unknown_id_is_404() {
    let server = server();
    let response = server.post("/invoices/nosuchinvoice/cancel").await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_cancel_twice_succeeds_under_default_policy() {
    let server = server();
    let receipt: EmitReceipt = server.post("/invoices").await.json();
    let path = format!("/invoices/{}/cancel", receipt.invoice_id);

    server.post(&path).await.assert_status_ok();
    server.post(&path).await.assert_status_ok();
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = server();
    let response = server
        .get("/public/ping")
        .add_header(
            axum::http::header::ORIGIN,
            axum::http::HeaderValue::from_static("https://example.com"),
        )
        .await;
    response.assert_status_ok();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

struct FailingDocumentStore;

#[async_trait]
impl DocumentStore for FailingDocumentStore {
    async fn put(&self, _: &str, _: Vec<u8>, _: &str) -> Result<(), DocumentError> {
        Err(DocumentError::Backend(anyhow::anyhow!("bucket is gone")))
    }

    async fn get(&self, _: &str) -> Result<Option<Vec<u8>>, DocumentError> {
        Err(DocumentError::Backend(anyhow::anyhow!("bucket is gone")))
    }
}

/// Publisher that records the event it saw, then refuses it.
#[derive(Default)]
struct RefusingPublisher {
    seen: std::sync::Mutex<Option<String>>,
}

#[async_trait]
impl EventPublisher for RefusingPublisher {
    async fn publish(&self, event: &InvoiceIssued) -> Result<(), QueueError> {
        *self.seen.lock().unwrap() = Some(event.invoice_id.clone());
        Err(QueueError::Backend(anyhow::anyhow!("queue is gone")))
    }
}

#[tokio::test]
async fn test_publish_failure_is_a_500_but_the_record_survives() {
    let publisher = Arc::new(RefusingPublisher::default());
    let invoices = InvoiceService::new(
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(InMemoryDocumentStore::new()),
    )
    .with_dispatch(publisher.clone());
    let server = server_with(invoices);

    let response = server.post("/invoices").await;
    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert_eq!(body["message"], "Internal error");

    // The record was written before dispatch and is not rolled back.
    let invoice_id = publisher.seen.lock().unwrap().clone().unwrap();
    let view: Value = server.get(&format!("/invoices/{invoice_id}")).await.json();
    assert_eq!(view["invoiceId"], invoice_id.as_str());
    assert_eq!(view["status"], "EMITTED");
}

#[tokio::test]
async fn test_backend_failure_is_a_masked_500() {
    let invoices = InvoiceService::new(
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(FailingDocumentStore),
    );
    let server = server_with(invoices);

    let response = server.post("/invoices").await;
    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "INTERNAL_ERROR");
    // The cause never leaks to the client.
    assert_eq!(body["message"], "Internal error");
}
