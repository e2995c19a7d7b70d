//! Driven port for facility reference data.

use async_trait::async_trait;

use crate::domain::Facility;

use super::define_port_error;

define_port_error! {
    /// Errors raised while reading facilities.
    pub enum FacilityRepositoryError {
        /// Store could not be reached.
        Connection { message: String } =>
            "facility repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "facility repository query failed: {message}",
    }
}

/// Port for reading the full facility set.
///
/// The set is re-read on every run, so facility changes take effect on the
/// next trigger without any push notification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FacilityRepository: Send + Sync {
    /// Return every facility, ordered by identifier.
    async fn list_facilities(&self) -> Result<Vec<Facility>, FacilityRepositoryError>;
}
