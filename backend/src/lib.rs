//! Change-driven vehicle-to-facility proximity detection.
//!
//! New location observations are read from the store after a per-pipeline
//! watermark, scored against every facility by great-circle distance, and
//! written as deduplicated proximity events before the watermark advances.

pub mod domain;
pub mod outbound;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
