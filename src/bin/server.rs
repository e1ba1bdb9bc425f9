//! Local NFS-e server: REST API plus the processor worker in one
//! process, over in-memory backends. The local equivalent of the
//! deployed stack.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use nfse::config::ServiceConfig;
use nfse::core::processor::InvoiceProcessor;
use nfse::core::service::InvoiceService;
use nfse::core::store::RecordStore;
use nfse::server::{RestExposure, ServerHost};
use nfse::storage::{InMemoryDocumentStore, InMemoryRecordStore, InMemoryWorkQueue};
use nfse::worker::ProcessorWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;

    let records: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    let queue = Arc::new(InMemoryWorkQueue::new(config.max_receive_count));

    let invoices = InvoiceService::new(records.clone(), documents)
        .with_dispatch(queue.clone())
        .with_cancel_policy(config.cancel_policy);
    let processor = Arc::new(InvoiceProcessor::new(records));
    let worker = ProcessorWorker::new(queue, processor).with_batch_size(config.batch_size);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    let bind_addr = config.bind_addr.clone();
    let host = Arc::new(ServerHost::new(config, invoices));
    let app = RestExposure::build_router(host);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "nfse server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    let _ = shutdown_tx.send(true);
    worker_handle.await?;
    Ok(())
}
