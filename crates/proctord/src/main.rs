//! proctord - The proctor monitoring service
//!
//! This is the main entry point for the proctord service.
//! It wires together all the components:
//! - Configuration loading
//! - Signal sources (replayed from NDJSON)
//! - Proctoring session and violation dispatch
//! - NDJSON event output on stdout

mod output;
mod replay;

use anyhow::{Context, Result, bail};
use clap::Parser;
use proctor_api::SourceSample;
use proctor_config::{Policy, load_config};
use proctor_core::{ProctorSession, SessionConfig};
use proctor_host_api::{
    EnvironmentMonitor, spawn_environment_forwarder, spawn_face_sampler,
};
use proctor_util::default_config_path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::output::EventWriter;
use crate::replay::ReplayHost;

/// proctord - Exam proctoring violation monitor
#[derive(Parser, Debug)]
#[command(name = "proctord")]
#[command(about = "Turns proctoring signals into throttled violation events", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/proctor/config.toml)
    #[arg(short, long, env = "PROCTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides the config file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Face sampling interval in milliseconds (overrides the config file)
    #[arg(long)]
    sample_interval_ms: Option<u64>,

    /// NDJSON signal records to replay (default: stdin)
    #[arg(short, long)]
    replay: Option<PathBuf>,
}

/// Main service state
struct Service {
    session: ProctorSession,
    host: Arc<ReplayHost>,
    sample_interval: Duration,
}

impl Service {
    fn new(policy: Policy, sample_interval: Duration) -> Self {
        let host = Arc::new(ReplayHost::new());

        let (checks, dropped) = host.capabilities().restrict(policy.checks);
        for check in dropped {
            warn!(?check, "Check not supported by this host, disabling");
        }

        let writer = Arc::new(EventWriter::new(std::io::stdout()));
        let session = ProctorSession::new(
            SessionConfig {
                throttles: policy.throttles,
                checks,
            },
            writer.clone(),
            writer,
        );

        Self {
            session,
            host,
            sample_interval,
        }
    }

    async fn run<R>(mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let reader = self.host.spawn_reader(input);

        if !self.session.begin_start()? {
            return Ok(());
        }

        let (tx, mut samples) = mpsc::unbounded_channel();
        let checks = *self.session.checks();

        if checks.face_detection {
            let handle = spawn_face_sampler(
                self.host.clone(),
                self.sample_interval,
                self.session.active_flag(),
                tx.clone(),
            );
            let abort = handle.abort_handle();
            self.session
                .listeners_mut()
                .register("camera", "frame", "face-detector", move || abort.abort());
        }

        let forwarder: Option<JoinHandle<()>> = if checks.any_environment() {
            let handle = spawn_environment_forwarder(self.host.subscribe(), tx.clone());
            let abort = handle.abort_handle();
            self.session.listeners_mut().register(
                "replay",
                "environment",
                "environment-monitor",
                move || abort.abort(),
            );
            Some(handle)
        } else {
            None
        };
        drop(tx);

        if let Err(e) = self.session.mark_running() {
            self.session.fail("Failed to start proctoring", e.to_string());
            bail!(e);
        }

        if checks.any_environment() {
            let notified = self.session.ingest_snapshot(self.host.snapshot());
            debug!(notified, "Initial environment checked");
        }

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        let mut drain_check = tokio::time::interval(self.sample_interval);

        info!(session_id = %self.session.id(), "Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                Some(sample) = samples.recv() => {
                    self.handle_sample(sample);
                }

                // Replay exhausted and every record consumed
                _ = drain_check.tick() => {
                    let faces_done = !checks.face_detection || self.host.pending_faces() == 0;
                    let environment_done = forwarder.as_ref().is_none_or(|h| h.is_finished());
                    if self.host.is_finished() && faces_done && environment_done {
                        while let Ok(sample) = samples.try_recv() {
                            self.handle_sample(sample);
                        }
                        info!("Replay finished, shutting down");
                        break;
                    }
                }
            }
        }

        info!("Shutting down proctord");
        self.session.stop();
        self.session.destroy();

        if !reader.is_finished() {
            reader.abort();
        }
        match reader.await {
            Ok(Ok(records)) => debug!(records, "Replay reader finished"),
            Ok(Err(e)) => warn!(error = %e, "Replay input failed"),
            Err(e) if e.is_cancelled() => {}
            Err(e) => warn!(error = %e, "Replay reader task failed"),
        }

        info!("Shutdown complete");
        Ok(())
    }

    fn handle_sample(&mut self, sample: SourceSample) {
        match sample {
            SourceSample::Faces(count) => {
                self.session.ingest_faces(count);
            }
            SourceSample::Environment(signal) => {
                self.session.ingest_environment(signal);
            }
        }
    }
}

/// Load the policy, falling back to defaults when no config file exists at
/// the default location
fn load_policy(args: &Args) -> Result<(Policy, PathBuf, bool)> {
    let (path, explicit) = match &args.config {
        Some(path) => (path.clone(), true),
        None => (default_config_path(), false),
    };

    if !explicit && !path.exists() {
        return Ok((Policy::default(), path, false));
    }

    let policy = load_config(&path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;
    Ok((policy, path, true))
}

// Single-threaded: a face frame is taken from the replay queue and sent on
// the sample channel without the drain check running in between.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut policy, config_path, loaded) = load_policy(&args)?;

    // Initialize logging (stderr, so stdout carries only events)
    let level = args
        .log_level
        .clone()
        .or_else(|| policy.service.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "proctord starting");

    if loaded {
        info!(config_path = %config_path.display(), "Configuration loaded");
    } else {
        info!(
            config_path = %config_path.display(),
            "No configuration file, using recommended defaults"
        );
    }
    for key in &policy.ignored_throttle_keys {
        warn!(key = %key, "Ignoring throttle for unknown violation type");
    }

    if let Some(ms) = args.sample_interval_ms {
        if ms == 0 {
            bail!("--sample-interval-ms must be greater than zero");
        }
        policy.service.sample_interval = Duration::from_millis(ms);
    }
    let sample_interval = policy.service.sample_interval;

    let service = Service::new(policy, sample_interval);

    match &args.replay {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open replay file {:?}", path))?;
            info!(replay = %path.display(), "Replaying signals from file");
            service.run(BufReader::new(file)).await
        }
        None => {
            info!("Replaying signals from stdin");
            service.run(BufReader::new(tokio::io::stdin())).await
        }
    }
}
