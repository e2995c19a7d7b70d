//! Feed cursor types: watermark, batch size, and pipeline identity.

use std::fmt;
use std::num::NonZeroUsize;

use serde::Serialize;

use super::fleet::ObservationId;

/// Boundary between processed and unprocessed observations.
///
/// Ordering follows feed order: [`Watermark::Start`] sorts before every
/// [`Watermark::After`] position.
///
/// # Examples
/// ```
/// use fleet_proximity::domain::{ObservationId, Watermark};
///
/// let watermark = Watermark::After(ObservationId::new(10));
/// assert!(watermark.admits(ObservationId::new(11)));
/// assert!(!watermark.admits(ObservationId::new(10)));
/// assert!(Watermark::Start.admits(ObservationId::new(1)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Watermark {
    /// Nothing processed yet.
    #[default]
    Start,
    /// Every observation up to and including this identifier is processed.
    After(ObservationId),
}

impl Watermark {
    /// Build a watermark from an optional stored cursor.
    pub fn from_last_processed(last: Option<ObservationId>) -> Self {
        last.map_or(Self::Start, Self::After)
    }

    /// Last fully processed observation, if any.
    pub fn last_processed(self) -> Option<ObservationId> {
        match self {
            Self::Start => None,
            Self::After(id) => Some(id),
        }
    }

    /// True when `id` lies beyond this watermark.
    pub fn admits(self, id: ObservationId) -> bool {
        self.last_processed().is_none_or(|last| id > last)
    }

    /// Move forward to `id`; never moves backwards.
    #[must_use]
    pub fn advanced_to(self, id: ObservationId) -> Self {
        self.max(Self::After(id))
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::After(id) => write!(f, "after:{id}"),
        }
    }
}

/// Maximum number of observations handled by one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    /// Default batch size.
    pub const DEFAULT: Self = match NonZeroUsize::new(500) {
        Some(size) => Self(size),
        None => Self(NonZeroUsize::MIN),
    };

    /// Build a batch size; zero is rejected.
    pub fn new(size: usize) -> Option<Self> {
        NonZeroUsize::new(size).map(Self)
    }

    /// Batch size as a count.
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Batch size as a SQL `LIMIT` value.
    pub fn as_i64(self) -> i64 {
        i64::try_from(self.get()).unwrap_or(i64::MAX)
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Validation errors for [`PipelineName`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineNameError {
    /// Name was blank.
    #[error("pipeline name must not be empty")]
    Empty,
    /// Name exceeded the storage column width.
    #[error("pipeline name must be at most {max} characters, got {actual}")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
        /// Received length.
        actual: usize,
    },
}

/// Identity of a pipeline; each name owns one watermark.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PipelineName(String);

impl PipelineName {
    /// Maximum name length, matching the watermark table column.
    pub const MAX_LEN: usize = 64;

    /// Validate and wrap a pipeline name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineNameError`] for blank or over-long names.
    pub fn new(name: impl Into<String>) -> Result<Self, PipelineNameError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(PipelineNameError::Empty);
        }
        let actual = name.chars().count();
        if actual > Self::MAX_LEN {
            return Err(PipelineNameError::TooLong {
                max: Self::MAX_LEN,
                actual,
            });
        }
        Ok(Self(name))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PipelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
