//! REST exposure: routes, handlers and the permissive CORS layer
//!
//! The exposure consumes a `ServerHost` and produces an Axum `Router`.
//! Authentication sits in front of the service (identity provider at
//! the edge); the handlers themselves carry no auth logic. Every
//! response passes through the fixed permissive CORS layer.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::error::ServiceError;
use crate::core::invoice::{CancelReceipt, EmitReceipt, EmitRequest, InvoiceView};
use crate::server::host::ServerHost;

/// REST API exposure implementation.
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a host.
    pub fn build_router(host: Arc<ServerHost>) -> Router {
        Router::new()
            .route("/invoices", post(emit_invoice))
            .route("/invoices/{id}", get(consult_invoice))
            .route("/invoices/{id}/cancel", post(cancel_invoice))
            .route("/public/ping", get(ping))
            .layer(TraceLayer::new_for_http())
            .layer(Self::cors_layer())
            .with_state(host)
    }

    /// Permissive cross-origin policy: any origin, standard methods,
    /// and the named request headers (the idempotency-key and API-key
    /// headers are allowed but unused by the handlers).
    fn cors_layer() -> CorsLayer {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-api-key"),
                HeaderName::from_static("idempotency-key"),
            ])
    }
}

/// POST /invoices
///
/// Both body fields are optional; a missing, malformed or non-UTF-8
/// body falls back to the documented defaults rather than failing.
async fn emit_invoice(
    State(host): State<Arc<ServerHost>>,
    body: Bytes,
) -> Result<(StatusCode, Json<EmitReceipt>), ServiceError> {
    let request: EmitRequest = serde_json::from_slice(&body).unwrap_or_default();
    let receipt = host.invoices.emit(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /invoices/{id}
async fn consult_invoice(
    State(host): State<Arc<ServerHost>>,
    Path(invoice_id): Path<String>,
) -> Result<Json<InvoiceView>, ServiceError> {
    let view = host.invoices.consult(&invoice_id).await?;
    Ok(Json(view))
}

/// POST /invoices/{id}/cancel
async fn cancel_invoice(
    State(host): State<Arc<ServerHost>>,
    Path(invoice_id): Path<String>,
) -> Result<Json<CancelReceipt>, ServiceError> {
    let receipt = host.invoices.cancel(&invoice_id).await?;
    Ok(Json(receipt))
}

/// GET /public/ping — liveness probe, no dependencies.
async fn ping() -> Json<Value> {
    Json(json!({ "ok": true }))
}
