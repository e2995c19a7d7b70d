//! Shared error mapping for the Diesel adapters.
//!
//! Every store port exposes the same `Connection`/`Query` split, so adapters
//! pass their error constructors here instead of repeating the match.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure into a port's connection error.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => connection(message),
    }
}

/// Map a Diesel failure into a port's query or connection error.
///
/// Details are logged at `debug`; the port error carries a short message.
pub(crate) fn map_diesel_error<E>(
    error: DieselError,
    operation: &'static str,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            %operation,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query(format!("{operation}: record not found")),
        DieselError::QueryBuilderError(_) => query(format!("{operation}: database query error")),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => {
            connection(format!("{operation}: database connection error"))
        }
        _ => query(format!("{operation}: database error")),
    }
}

/// Convert a domain count into a SQL `LIMIT`.
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::WatermarkStoreError;

    fn map(error: DieselError) -> WatermarkStoreError {
        map_diesel_error(
            error,
            "advance watermark",
            WatermarkStoreError::query,
            WatermarkStoreError::connection,
        )
    }

    #[rstest]
    fn not_found_is_a_query_error() {
        assert_eq!(
            map(DieselError::NotFound),
            WatermarkStoreError::query("advance watermark: record not found")
        );
    }

    #[rstest]
    fn broken_transactions_are_connection_errors() {
        assert_eq!(
            map(DieselError::BrokenTransactionManager),
            WatermarkStoreError::connection("advance watermark: database connection error")
        );
    }

    #[rstest]
    #[case(PoolError::checkout("timed out"))]
    #[case(PoolError::build("bad url"))]
    fn pool_failures_are_connection_errors(#[case] error: PoolError) {
        let mapped = map_pool_error(error, WatermarkStoreError::connection);
        assert!(matches!(mapped, WatermarkStoreError::Connection { .. }));
    }

    #[rstest]
    fn limits_saturate() {
        assert_eq!(sql_limit(25), 25);
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
    }
}
