//! Shared helpers for the Diesel adapter integration suites.
//!
//! Each file under `backend/tests/` compiles as its own crate, so the suites
//! pull these in with `mod support;`. Not every suite uses every helper.

pub mod cluster_skip;
pub mod embedded_postgres;
pub mod fleet_seed;
pub mod test_database;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{provision_template_database, shared_cluster};
pub use test_database::{TestDatabase, setup_database};

/// Render a `postgres` error with its SQLSTATE and server message.
///
/// `postgres::Error`'s `Display` collapses database errors to `db error`,
/// which hides the constraint or column that failed.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );

    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }

    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }

    summary
}
