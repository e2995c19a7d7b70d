//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: PostgreSQL store via Diesel (production)
//! - **memory**: in-process store with the same atomic guarantees (tests,
//!   dry runs)
//! - **metrics**: Prometheus exporters (feature-gated)
//!
//! Adapters translate between infrastructure representations and domain
//! types. They contain no pipeline logic.

pub mod memory;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod persistence;
