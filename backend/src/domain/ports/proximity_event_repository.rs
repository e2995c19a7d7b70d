//! Driven port for the deduplicating proximity event writer.
//!
//! Deduplication is a storage guarantee, not an in-process one: several
//! pipeline instances may write the same (vehicle, facility, observation)
//! triple concurrently, and the store must persist exactly one row. A repeat
//! is reported as [`RecordOutcome::AlreadyExists`], never as an error.

use async_trait::async_trait;

use crate::domain::{NewProximityEvent, ProximityEvent, ProximityEventId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by proximity event adapters.
    pub enum ProximityEventRepositoryError {
        /// Store could not be reached.
        Connection { message: String } =>
            "proximity event repository connection failed: {message}",
        /// Query or insert failed during execution.
        Query { message: String } =>
            "proximity event repository query failed: {message}",
    }
}

/// Result of a conditional insert.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// This call persisted the event.
    Written(ProximityEvent),
    /// An event for the same triple already exists; nothing was written.
    AlreadyExists,
}

impl RecordOutcome {
    /// True when this call persisted a new row.
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Port for persisting and reading proximity events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProximityEventRepository: Send + Sync {
    /// Persist `event` unless its triple is already stored.
    async fn record_if_new(
        &self,
        event: &NewProximityEvent,
    ) -> Result<RecordOutcome, ProximityEventRepositoryError>;

    /// Read up to `limit` events with identifiers after `after`, in order.
    ///
    /// Downstream alerting uses this as its own cursor over the event log.
    async fn list_after(
        &self,
        after: Option<ProximityEventId>,
        limit: usize,
    ) -> Result<Vec<ProximityEvent>, ProximityEventRepositoryError>;
}
