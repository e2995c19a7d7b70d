//! Pipeline settings loaded via OrthoConfig.
//!
//! Values come from `PROXIMITY_*` environment variables and configuration
//! files; unset values fall back to the defaults below.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{
    BatchSize, DEFAULT_PROXIMITY_THRESHOLD_METERS, EARTH_MEAN_RADIUS_METERS, GeoError, Haversine,
    PipelineConfig, PipelineName, PipelineNameError, ProximityEvaluator, ProximityThreshold,
    ProximityThresholdError,
};

const DEFAULT_PIPELINE_NAME: &str = "proximity";
const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_BATCH_SIZE: usize = 500;

/// Raw pipeline settings.
///
/// Every field carries a layered default, so an empty environment loads.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PROXIMITY")]
pub struct PipelineSettings {
    /// Inclusive proximity cutoff in metres.
    #[ortho_config(default = DEFAULT_PROXIMITY_THRESHOLD_METERS)]
    pub proximity_threshold_meters: f64,
    /// Sphere radius used for great-circle distance.
    #[ortho_config(default = EARTH_MEAN_RADIUS_METERS)]
    pub earth_radius_meters: f64,
    /// Maximum observations per run.
    #[ortho_config(default = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Pipeline identity; each name owns one watermark.
    #[ortho_config(default = String::from(DEFAULT_PIPELINE_NAME))]
    pub pipeline_name: String,
    /// Trigger interval for `watch`.
    #[ortho_config(default = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,
    /// Upper bound on consecutive runs in one drain.
    #[ortho_config(default = PipelineConfig::DEFAULT_MAX_RUNS_PER_DRAIN)]
    pub max_runs_per_drain: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            proximity_threshold_meters: DEFAULT_PROXIMITY_THRESHOLD_METERS,
            earth_radius_meters: EARTH_MEAN_RADIUS_METERS,
            batch_size: DEFAULT_BATCH_SIZE,
            pipeline_name: DEFAULT_PIPELINE_NAME.to_owned(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_runs_per_drain: PipelineConfig::DEFAULT_MAX_RUNS_PER_DRAIN,
        }
    }
}

/// Invalid settings values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    /// Threshold was negative or not finite.
    #[error("invalid proximity threshold: {0}")]
    Threshold(#[from] ProximityThresholdError),
    /// Sphere radius was not a finite positive number.
    #[error("invalid earth radius: {0}")]
    Radius(#[from] GeoError),
    /// Batch size was zero.
    #[error("batch size must be at least 1")]
    BatchSize,
    /// Pipeline name was blank or too long.
    #[error("invalid pipeline name: {0}")]
    PipelineName(#[from] PipelineNameError),
    /// Poll interval was zero.
    #[error("poll interval must be at least 1 ms")]
    PollInterval,
}

impl PipelineSettings {
    /// Trigger interval for the polling loop.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::PollInterval`] for a zero interval.
    pub fn poll_interval(&self) -> Result<Duration, SettingsError> {
        match self.poll_interval_ms {
            0 => Err(SettingsError::PollInterval),
            millis => Ok(Duration::from_millis(millis)),
        }
    }

    /// Distance model and cutoff.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] for an invalid radius or threshold.
    pub fn evaluator(&self) -> Result<ProximityEvaluator, SettingsError> {
        let haversine = Haversine::with_radius(self.earth_radius_meters)?;
        let threshold = ProximityThreshold::new(self.proximity_threshold_meters)?;
        Ok(ProximityEvaluator::new(haversine, threshold))
    }

    /// Validate settings into a [`PipelineConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] naming the first invalid value.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, SettingsError> {
        let name = PipelineName::new(self.pipeline_name.as_str())?;
        let batch_size = BatchSize::new(self.batch_size).ok_or(SettingsError::BatchSize)?;
        Ok(PipelineConfig::new(name)
            .with_evaluator(self.evaluator()?)
            .with_batch_size(batch_size)
            .with_max_runs_per_drain(self.max_runs_per_drain))
    }
}
