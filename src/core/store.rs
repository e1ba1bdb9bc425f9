//! Record store contract: a conditional-write key-value store keyed by
//! invoice identifier
//!
//! Concurrency correctness is delegated entirely to the store's per-key
//! conditional-write primitive: every status-changing write is a single
//! atomic update guarded by a precondition on existing state, and a
//! violated precondition is distinguishable from any other failure.

use crate::core::invoice::{InvoiceRecord, InvoiceStatus};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a record store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write's precondition did not hold.
    #[error("conditional check failed")]
    ConditionFailed,

    /// Any other backend failure.
    #[error("record store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// A status-changing write, carrying the timestamp it stamps.
///
/// EMITTED is not a transition target: records are only created in that
/// status, never moved back into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    Processing { at: String },
    Processed { at: String },
    Cancelled { at: String },
}

impl StatusTransition {
    /// Status this transition moves the record into.
    pub fn status(&self) -> InvoiceStatus {
        match self {
            StatusTransition::Processing { .. } => InvoiceStatus::Processing,
            StatusTransition::Processed { .. } => InvoiceStatus::Processed,
            StatusTransition::Cancelled { .. } => InvoiceStatus::Cancelled,
        }
    }

    /// Timestamp carried by this transition.
    pub fn at(&self) -> &str {
        match self {
            StatusTransition::Processing { at }
            | StatusTransition::Processed { at }
            | StatusTransition::Cancelled { at } => at,
        }
    }

    /// Wire name of the timestamp attribute this transition stamps.
    pub fn timestamp_attribute(&self) -> &'static str {
        match self {
            StatusTransition::Processing { .. } => "processingAt",
            StatusTransition::Processed { .. } => "processedAt",
            StatusTransition::Cancelled { .. } => "cancelledAt",
        }
    }

    /// Apply the transition to an in-process record.
    pub fn apply(&self, record: &mut InvoiceRecord) {
        record.status = self.status();
        let at = Some(self.at().to_string());
        match self {
            StatusTransition::Processing { .. } => record.processing_at = at,
            StatusTransition::Processed { .. } => record.processed_at = at,
            StatusTransition::Cancelled { .. } => record.cancelled_at = at,
        }
    }
}

/// Precondition attached to a status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusGuard {
    /// Unconditional write.
    None,

    /// The record must already exist.
    Exists,

    /// The record must exist with exactly this status.
    ExistsWithStatus(InvoiceStatus),

    /// The record must exist with a status outside this set.
    ExistsOutside(Vec<InvoiceStatus>),
}

impl StatusGuard {
    /// Evaluate the guard against the current record, if any.
    ///
    /// In-process backends use this; remote backends express the same
    /// predicate as a native condition expression.
    pub fn permits(&self, current: Option<&InvoiceRecord>) -> bool {
        match self {
            StatusGuard::None => true,
            StatusGuard::Exists => current.is_some(),
            StatusGuard::ExistsWithStatus(expected) => {
                current.is_some_and(|record| record.status == *expected)
            }
            StatusGuard::ExistsOutside(excluded) => {
                current.is_some_and(|record| !excluded.contains(&record.status))
            }
        }
    }
}

/// The conditional-write key-value store holding invoice records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point lookup by invoice identifier.
    async fn get(&self, invoice_id: &str) -> Result<Option<InvoiceRecord>, StoreError>;

    /// Create a record under the precondition that its identifier does
    /// not already exist. A violation is `StoreError::ConditionFailed`.
    async fn put_new(&self, record: InvoiceRecord) -> Result<(), StoreError>;

    /// Apply a status transition as a single atomic conditional update.
    /// A guard violation is `StoreError::ConditionFailed`.
    async fn update_status(
        &self,
        invoice_id: &str,
        transition: StatusTransition,
        guard: StatusGuard,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invoice::InvoiceRecord;

    fn emitted_record() -> InvoiceRecord {
        InvoiceRecord::emitted("abc123def456", "123", 10.0, "2026-01-01T00:00:00.000000Z")
    }

    #[test]
    fn test_guard_none_permits_anything() {
        assert!(StatusGuard::None.permits(None));
        assert!(StatusGuard::None.permits(Some(&emitted_record())));
    }

    #[test]
    fn test_guard_exists() {
        assert!(!StatusGuard::Exists.permits(None));
        assert!(StatusGuard::Exists.permits(Some(&emitted_record())));
    }

    #[test]
    fn test_guard_exists_with_status() {
        let guard = StatusGuard::ExistsWithStatus(InvoiceStatus::Emitted);
        assert!(guard.permits(Some(&emitted_record())));
        assert!(!guard.permits(None));

        let mut advanced = emitted_record();
        advanced.status = InvoiceStatus::Processing;
        assert!(!guard.permits(Some(&advanced)));
    }

    #[test]
    fn test_guard_exists_outside() {
        let guard =
            StatusGuard::ExistsOutside(vec![InvoiceStatus::Processed, InvoiceStatus::Cancelled]);
        assert!(guard.permits(Some(&emitted_record())));
        assert!(!guard.permits(None));

        let mut terminal = emitted_record();
        terminal.status = InvoiceStatus::Cancelled;
        assert!(!guard.permits(Some(&terminal)));
    }

    #[test]
    fn test_transition_apply_stamps_matching_timestamp() {
        let mut record = emitted_record();
        StatusTransition::Processing {
            at: "2026-01-01T00:00:01.000000Z".to_string(),
        }
        .apply(&mut record);
        assert_eq!(record.status, InvoiceStatus::Processing);
        assert_eq!(
            record.processing_at.as_deref(),
            Some("2026-01-01T00:00:01.000000Z")
        );
        assert!(record.processed_at.is_none());

        StatusTransition::Cancelled {
            at: "2026-01-01T00:00:02.000000Z".to_string(),
        }
        .apply(&mut record);
        assert_eq!(record.status, InvoiceStatus::Cancelled);
        assert!(record.cancelled_at.is_some());
    }

    #[test]
    fn test_transition_timestamp_attributes() {
        let at = String::new();
        assert_eq!(
            StatusTransition::Processing { at: at.clone() }.timestamp_attribute(),
            "processingAt"
        );
        assert_eq!(
            StatusTransition::Processed { at: at.clone() }.timestamp_attribute(),
            "processedAt"
        );
        assert_eq!(
            StatusTransition::Cancelled { at }.timestamp_attribute(),
            "cancelledAt"
        );
    }
}
