//! Environment-driven service configuration
//!
//! The deployed service receives its collaborator names through the
//! environment (`TABLE_INVOICES`, `BUCKET_DOCS`, `QUEUE_URL`); tunables
//! carry the reference defaults: batches of 5 messages, 3 deliveries
//! before dead-lettering.

use thiserror::Error;

/// Messages handled per consumer invocation.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Deliveries before a message is routed to the dead-letter destination.
pub const DEFAULT_MAX_RECEIVE_COUNT: u32 = 3;

/// Policy applied by the cancel operation.
///
/// The reference behavior places no status guard on cancellation: an
/// already-PROCESSED or already-CANCELLED invoice can be cancelled
/// again. `RefuseTerminal` is the opt-in stricter policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CancelPolicy {
    /// Cancel any existing record regardless of current status.
    #[default]
    AnyStatus,

    /// Refuse to cancel records already PROCESSED or CANCELLED.
    RefuseTerminal,
}

impl CancelPolicy {
    /// Parse the policy from its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "any-status" => Some(CancelPolicy::AnyStatus),
            "refuse-terminal" => Some(CancelPolicy::RefuseTerminal),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: {message}")]
    InvalidValue {
        var: String,
        value: String,
        message: String,
    },
}

/// Service configuration, initialized once at process start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Record store table name (DynamoDB backend).
    pub invoices_table: String,

    /// Document store bucket name (S3 backend).
    pub documents_bucket: String,

    /// Work queue URL (SQS backend). Dispatch is disabled when absent.
    pub queue_url: Option<String>,

    /// Messages handled per consumer invocation.
    pub batch_size: usize,

    /// Deliveries before a message is dead-lettered.
    pub max_receive_count: u32,

    /// Cancel policy toggle.
    pub cancel_policy: CancelPolicy,

    /// Listen address for the HTTP server.
    pub bind_addr: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            invoices_table: "invoices".to_string(),
            documents_bucket: "invoice-docs".to_string(),
            queue_url: None,
            batch_size: DEFAULT_BATCH_SIZE,
            max_receive_count: DEFAULT_MAX_RECEIVE_COUNT,
            cancel_policy: CancelPolicy::default(),
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the environment, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(table) = std::env::var("TABLE_INVOICES") {
            config.invoices_table = table;
        }
        if let Ok(bucket) = std::env::var("BUCKET_DOCS") {
            config.documents_bucket = bucket;
        }
        if let Ok(url) = std::env::var("QUEUE_URL") {
            if !url.is_empty() {
                config.queue_url = Some(url);
            }
        }
        if let Ok(raw) = std::env::var("BATCH_SIZE") {
            config.batch_size = parse_var("BATCH_SIZE", &raw)?;
        }
        if let Ok(raw) = std::env::var("MAX_RECEIVE_COUNT") {
            config.max_receive_count = parse_var("MAX_RECEIVE_COUNT", &raw)?;
        }
        if let Ok(raw) = std::env::var("CANCEL_POLICY") {
            config.cancel_policy =
                CancelPolicy::from_name(&raw).ok_or_else(|| ConfigError::InvalidValue {
                    var: "CANCEL_POLICY".to_string(),
                    value: raw,
                    message: "expected 'any-status' or 'refuse-terminal'".to_string(),
                })?;
        }
        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|err: T::Err| ConfigError::InvalidValue {
        var: var.to_string(),
        value: raw.to_string(),
        message: err.to_string(),
    })
}
