//! Server host: injected collaborators shared across requests
//!
//! The host is built once at process start from the configured
//! backends and reused for every invocation; no teardown is required
//! mid-process.

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::core::service::InvoiceService;

/// Host context handed to the HTTP exposure.
pub struct ServerHost {
    pub config: Arc<ServiceConfig>,
    pub invoices: Arc<InvoiceService>,
}

impl ServerHost {
    pub fn new(config: ServiceConfig, invoices: InvoiceService) -> Self {
        Self {
            config: Arc::new(config),
            invoices: Arc::new(invoices),
        }
    }
}
