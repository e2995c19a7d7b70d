//! Change-driven proximity detection pipeline.
//!
//! One triggered run walks `READING -> EVALUATING -> WRITING -> COMMITTING`:
//! load the watermark and the next batch of observations, score each
//! observation against the facility set, write qualifying pairs through the
//! deduplicating writer, then advance the watermark. Any failure before the
//! commit leaves the watermark untouched, so the batch is replayed in full on
//! the next trigger and the writer absorbs the repeats.
//!
//! Runs may overlap, within one process or across several. Correctness rests
//! on the store: a unique constraint on the event triple and a monotonic
//! conditional watermark write.

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::domain::ports::{
    FacilityRepository, ObservationFeed, PipelineFailureKind, PipelineMetrics,
    PipelineRunCounts, ProximityEventRepository, RecordOutcome, WatermarkAdvance, WatermarkStore,
};
use crate::domain::{
    Facility, LocationObservation, NewProximityEvent, PipelineName, ProximityKey, ProximityMatch,
    Watermark,
};

mod error;
mod runtime;

pub use error::PipelineError;
pub use runtime::{PipelineConfig, ProximityPipelinePorts};

/// What one completed run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Watermark loaded at the start of the run.
    pub watermark_before: Watermark,
    /// Watermark committed by the run (unchanged for an empty batch).
    pub watermark_after: Watermark,
    /// Observations read from the feed.
    pub observations_read: usize,
    /// Observations skipped for invalid coordinates.
    pub observations_skipped: usize,
    /// Facilities considered by the run.
    pub facilities_considered: usize,
    /// Qualifying (observation, facility) pairs.
    pub matches: usize,
    /// Events persisted by this run.
    pub events_written: usize,
    /// Qualifying pairs that were already persisted.
    pub duplicates: usize,
}

impl RunSummary {
    fn starting_at(watermark: Watermark) -> Self {
        Self {
            watermark_before: watermark,
            watermark_after: watermark,
            observations_read: 0,
            observations_skipped: 0,
            facilities_considered: 0,
            matches: 0,
            events_written: 0,
            duplicates: 0,
        }
    }

    fn counts(&self) -> PipelineRunCounts {
        PipelineRunCounts {
            observations_read: self.observations_read,
            observations_skipped: self.observations_skipped,
            events_written: self.events_written,
            duplicates: self.duplicates,
        }
    }
}

/// Domain-owned proximity pipeline.
pub struct ProximityPipeline {
    feed: Arc<dyn ObservationFeed>,
    facilities: Arc<dyn FacilityRepository>,
    events: Arc<dyn ProximityEventRepository>,
    watermarks: Arc<dyn WatermarkStore>,
    metrics: Arc<dyn PipelineMetrics>,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
}

impl ProximityPipeline {
    /// Build a pipeline from its ports, a clock for event timestamps, and
    /// configuration.
    pub fn new(
        ports: ProximityPipelinePorts,
        clock: Arc<dyn Clock>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            feed: ports.feed,
            facilities: ports.facilities,
            events: ports.events,
            watermarks: ports.watermarks,
            metrics: ports.metrics,
            clock,
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Pipeline identity.
    pub fn name(&self) -> &PipelineName {
        &self.config.pipeline_name
    }

    /// Execute one triggered run.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the run aborts; the watermark is not
    /// advanced in that case.
    pub async fn run_once(&self) -> Result<RunSummary, PipelineError> {
        let span = info_span!("proximity_run", pipeline = %self.config.pipeline_name);
        let result = self.execute_run().instrument(span).await;
        match &result {
            Ok(summary) => self.record_run_metric(summary).await,
            Err(error) => self.record_failure_metric(error.kind()).await,
        }
        result
    }

    /// Repeat runs until the feed is drained or the drain bound is hit.
    ///
    /// A run that reads fewer observations than the batch size means the
    /// pipeline has caught up.
    ///
    /// # Errors
    ///
    /// Returns the first [`PipelineError`]; runs completed before it keep
    /// their committed watermarks.
    pub async fn drain(&self) -> Result<Vec<RunSummary>, PipelineError> {
        let mut summaries = Vec::new();
        for _ in 0..self.config.max_runs_per_drain {
            let summary = self.run_once().await?;
            let caught_up = summary.observations_read < self.config.batch_size.get();
            summaries.push(summary);
            if caught_up {
                return Ok(summaries);
            }
        }
        warn!(
            pipeline = %self.config.pipeline_name,
            runs = summaries.len(),
            "drain stopped at the run limit before catching up"
        );
        Ok(summaries)
    }

    async fn execute_run(&self) -> Result<RunSummary, PipelineError> {
        let name = &self.config.pipeline_name;

        let watermark = self
            .watermarks
            .load(name)
            .await
            .map_err(|source| PipelineError::WatermarkUnavailable { source })?;
        let mut summary = RunSummary::starting_at(watermark);

        let mut observations = self
            .feed
            .poll_new_observations(watermark, self.config.batch_size)
            .await
            .map_err(|source| PipelineError::FeedUnavailable { source })?;
        if observations.is_empty() {
            debug!(%watermark, "no new observations");
            return Ok(summary);
        }
        observations.sort_by_key(|observation| observation.id);
        summary.observations_read = observations.len();

        let facilities = self.load_facilities().await?;
        summary.facilities_considered = facilities.len();

        let mut high_water = watermark;
        for observation in &observations {
            high_water = high_water.advanced_to(observation.id);
            let Some(matches) = self.evaluate(observation, &facilities) else {
                summary.observations_skipped += 1;
                continue;
            };
            summary.matches += matches.len();
            for candidate in matches {
                self.write_event(observation, candidate, &mut summary)
                    .await?;
            }
        }

        if let Some(processed) = high_water.last_processed() {
            let advance = self
                .watermarks
                .advance(name, processed)
                .await
                .map_err(|source| PipelineError::WatermarkCommitFailure { processed, source })?;
            if advance == WatermarkAdvance::AlreadyAhead {
                debug!(%processed, "watermark already advanced by an overlapping run");
            }
        }
        summary.watermark_after = high_water;

        info!(
            watermark_before = %summary.watermark_before,
            watermark_after = %summary.watermark_after,
            observations_read = summary.observations_read,
            observations_skipped = summary.observations_skipped,
            matches = summary.matches,
            events_written = summary.events_written,
            duplicates = summary.duplicates,
            "proximity run committed"
        );
        Ok(summary)
    }

    async fn load_facilities(&self) -> Result<Vec<Facility>, PipelineError> {
        let facilities = self
            .facilities
            .list_facilities()
            .await
            .map_err(|source| PipelineError::FacilitiesUnavailable { source })?;

        let mut usable: Vec<Facility> = facilities
            .into_iter()
            .filter(|facility| match facility.location.validate() {
                Ok(_) => true,
                Err(error) => {
                    warn!(
                        facility_id = %facility.id,
                        %error,
                        "excluding facility with invalid coordinate"
                    );
                    false
                }
            })
            .collect();
        usable.sort_by_key(|facility| facility.id);
        Ok(usable)
    }

    fn evaluate(
        &self,
        observation: &LocationObservation,
        facilities: &[Facility],
    ) -> Option<Vec<ProximityMatch>> {
        match self.config.evaluator.evaluate(observation, facilities) {
            Ok(matches) => Some(matches),
            Err(error) => {
                warn!(
                    observation_id = %observation.id,
                    vehicle_id = %observation.vehicle_id,
                    %error,
                    "skipping observation with invalid coordinate"
                );
                None
            }
        }
    }

    async fn write_event(
        &self,
        observation: &LocationObservation,
        candidate: ProximityMatch,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        let key = ProximityKey {
            vehicle_id: observation.vehicle_id,
            facility_id: candidate.facility_id,
            observation_id: observation.id,
        };
        let event = NewProximityEvent {
            key,
            distance_meters: candidate.distance_meters,
            recorded_at: self.clock.utc(),
        };

        match self.events.record_if_new(&event).await {
            Ok(RecordOutcome::Written(stored)) => {
                info!(
                    event_id = %stored.id,
                    vehicle_id = %key.vehicle_id,
                    facility_id = %key.facility_id,
                    observation_id = %key.observation_id,
                    distance_meters = stored.distance_meters,
                    "proximity event written"
                );
                summary.events_written += 1;
                Ok(())
            }
            Ok(RecordOutcome::AlreadyExists) => {
                debug!(
                    vehicle_id = %key.vehicle_id,
                    facility_id = %key.facility_id,
                    observation_id = %key.observation_id,
                    "proximity event already recorded"
                );
                summary.duplicates += 1;
                Ok(())
            }
            Err(source) => Err(PipelineError::EventWriteFailed { key, source }),
        }
    }

    async fn record_run_metric(&self, summary: &RunSummary) {
        if let Err(error) = self.metrics.record_run(&summary.counts()).await {
            debug!(%error, "pipeline run metric not recorded");
        }
    }

    async fn record_failure_metric(&self, kind: PipelineFailureKind) {
        warn!(
            pipeline = %self.config.pipeline_name,
            failure = kind.as_str(),
            "proximity run aborted; watermark left in place"
        );
        if let Err(error) = self.metrics.record_failure(kind).await {
            debug!(%error, "pipeline failure metric not recorded");
        }
    }
}
