//! `fleet-proximity` entry point: migrations, triggered runs, and the
//! polling trigger loop.

use std::env;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use fleet_proximity::domain::{
    Coordinate, ProximityPipeline, ProximityPipelinePorts, RunSummary, meters_to_kilometres,
};
use fleet_proximity::outbound::persistence::{
    DbPool, PoolConfig, diesel_ports, run_pending_migrations,
};
use fleet_proximity::settings::PipelineSettings;

/// `fleet-proximity` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "fleet-proximity",
    about = "Detect vehicles entering proximity of fixed facilities",
    version
)]
struct Cli {
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Execute one triggered run and print its summary.
    Run,
    /// Repeat runs until the change feed is caught up.
    Drain,
    /// Poll the change feed on the configured interval until ctrl-c.
    Watch,
    /// Compute the distance between two points and classify it.
    Distance {
        /// Origin as `lat,lon`.
        #[arg(long, value_name = "lat,lon", value_parser = parse_coordinate)]
        from: Coordinate,
        /// Destination as `lat,lon`.
        #[arg(long, value_name = "lat,lon", value_parser = parse_coordinate)]
        to: Coordinate,
    },
}

#[derive(Debug, Serialize)]
struct DistanceReport {
    from: Coordinate,
    to: Coordinate,
    distance_meters: f64,
    distance_kilometres: f64,
    threshold_meters: f64,
    within_threshold: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let settings = PipelineSettings::load_from_iter([std::ffi::OsString::from("fleet-proximity")])
        .wrap_err("failed to load pipeline settings")?;

    match cli.command {
        Command::Migrate => {
            let url = resolve_database_url(cli.database_url)?;
            let applied = run_pending_migrations(&url).await?;
            write_json(&applied)
        }
        Command::Distance { from, to } => distance(&settings, from, to),
        Command::Run => {
            let pipeline = connect_pipeline(&settings, cli.database_url).await?;
            let summary = pipeline.run_once().await?;
            write_json(&summary)
        }
        Command::Drain => {
            let pipeline = connect_pipeline(&settings, cli.database_url).await?;
            let summaries = pipeline.drain().await?;
            write_json(&summaries)
        }
        Command::Watch => {
            let interval = settings.poll_interval()?;
            let pipeline = connect_pipeline(&settings, cli.database_url).await?;
            watch(&pipeline, interval).await?;
            report_metrics()
        }
    }
}

async fn connect_pipeline(
    settings: &PipelineSettings,
    database_url: Option<String>,
) -> Result<ProximityPipeline> {
    let config = settings.pipeline_config()?;
    let url = resolve_database_url(database_url)?;
    let pool = DbPool::new(PoolConfig::new(url))
        .await
        .wrap_err("failed to create database pool")?;
    let ports = with_metrics(diesel_ports(&pool))?;
    Ok(ProximityPipeline::new(ports, Arc::new(DefaultClock), config))
}

#[cfg(feature = "metrics")]
fn with_metrics(ports: ProximityPipelinePorts) -> Result<ProximityPipelinePorts> {
    use fleet_proximity::outbound::metrics::PrometheusPipelineMetrics;

    let metrics = PrometheusPipelineMetrics::new(prometheus::default_registry())
        .wrap_err("failed to register pipeline metrics")?;
    Ok(ports.with_metrics(Arc::new(metrics)))
}

#[cfg(not(feature = "metrics"))]
#[expect(
    clippy::unnecessary_wraps,
    reason = "signature matches the metrics-enabled variant"
)]
fn with_metrics(ports: ProximityPipelinePorts) -> Result<ProximityPipelinePorts> {
    Ok(ports)
}

/// Write the Prometheus text exposition of the run counters on shutdown.
#[cfg(feature = "metrics")]
fn report_metrics() -> Result<()> {
    use prometheus::{Encoder, TextEncoder};

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::default_registry().gather(), &mut buffer)
        .wrap_err("failed to encode metrics")?;
    io::stdout()
        .lock()
        .write_all(&buffer)
        .wrap_err("failed to write metrics")
}

#[cfg(not(feature = "metrics"))]
#[expect(
    clippy::unnecessary_wraps,
    reason = "signature matches the metrics-enabled variant"
)]
fn report_metrics() -> Result<()> {
    Ok(())
}

async fn watch(pipeline: &ProximityPipeline, interval: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    info!(pipeline = %pipeline.name(), ?interval, "watching change feed");

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal.wrap_err("failed to listen for ctrl-c")?;
                info!("shutdown requested; next start resumes from the committed watermark");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        match pipeline.drain().await {
            Ok(summaries) => {
                let active: Vec<&RunSummary> = summaries
                    .iter()
                    .filter(|summary| summary.observations_read > 0)
                    .collect();
                if !active.is_empty() {
                    write_json(&active)?;
                }
            }
            Err(error) => warn!(
                %error,
                retryable = error.is_retryable(),
                "proximity run failed; retrying on next tick"
            ),
        }
    }
}

fn distance(settings: &PipelineSettings, from: Coordinate, to: Coordinate) -> Result<()> {
    let evaluator = settings.evaluator()?;
    let distance_meters = evaluator.haversine().distance_meters(from, to)?;
    write_json(&DistanceReport {
        from,
        to,
        distance_meters,
        distance_kilometres: meters_to_kilometres(distance_meters),
        threshold_meters: evaluator.threshold().meters(),
        within_threshold: evaluator.threshold().admits(distance_meters),
    })
}

fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).wrap_err("failed to render output")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}").wrap_err("failed to write output")
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (latitude, longitude) = raw
        .split_once(',')
        .ok_or_else(|| "coordinate must be `lat,lon`".to_owned())?;
    let latitude = latitude
        .trim()
        .parse::<f64>()
        .map_err(|error| format!("failed to parse latitude: {error}"))?;
    let longitude = longitude
        .trim()
        .parse::<f64>()
        .map_err(|error| format!("failed to parse longitude: {error}"))?;
    Coordinate::new(latitude, longitude).map_err(|error| error.to_string())
}

fn resolve_database_url(explicit: Option<String>) -> Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(eyre!("--database-url must not be empty when provided"));
        }
        return Ok(value);
    }

    let from_env = env::var("DATABASE_URL")
        .map_err(|_| eyre!("database URL missing: set --database-url or DATABASE_URL"))?;
    if from_env.trim().is_empty() {
        return Err(eyre!("DATABASE_URL must not be empty"));
    }
    Ok(from_env)
}
