// Poll-publish loop: fetch a snapshot, ingest it, render the store, broadcast, sleep.
// The loop task owns the store; subscribers only ever see rendered payloads.

use crate::models::encode_payload;
use crate::publisher::Publisher;
use crate::source::MetricsSource;
use crate::store::SeriesStore;
use tokio::time::{Duration, Instant};
use tracing::instrument;

/// Rate limit for "no subscribers" debug line (avoid logging every cycle when nobody is connected)
const NO_SUBSCRIBERS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Result of one fetch-ingest-render-publish pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Store updated and payload handed to `subscribers` receivers.
    Published { cycle: u64, subscribers: usize },
    /// Fetch or decode failed; store untouched, nothing published.
    FetchFailed,
    /// Snapshot decoded but rejected by the store; store untouched, nothing published.
    Rejected,
    /// Store updated but the payload could not be serialized; nothing published.
    EncodeFailed,
}

pub struct PollLoop<S> {
    source: S,
    store: SeriesStore,
    publisher: Publisher,
}

impl<S: MetricsSource> PollLoop<S> {
    pub fn new(source: S, store: SeriesStore, publisher: Publisher) -> Self {
        Self {
            source,
            store,
            publisher,
        }
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let snapshot = match self.source.fetch().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, operation = "fetch", "statistics fetch failed");
                return CycleOutcome::FetchFailed;
            }
        };

        if let Err(e) = self.store.ingest_snapshot(&snapshot, timestamp_label()) {
            tracing::warn!(error = %e, operation = "ingest_snapshot", "snapshot rejected");
            return CycleOutcome::Rejected;
        }

        let payload = match encode_payload(&self.store.render()) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, operation = "encode_payload", "render failed");
                return CycleOutcome::EncodeFailed;
            }
        };

        let subscribers = self.publisher.publish(payload);
        let cycle = self.store.cycles();
        tracing::debug!(
            cycle,
            devices = self.store.device_count(),
            ports = self.store.port_count(),
            subscribers,
            "cycle published"
        );
        CycleOutcome::Published { cycle, subscribers }
    }
}

/// Loop timing and logging config.
pub struct WorkerConfig {
    /// Sleep between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
    /// How often to log app stats (real time).
    pub stats_log_interval: Duration,
}

/// Local wall-clock label for one cycle, e.g. "14:03:27".
pub fn timestamp_label() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Spawns the poll loop. Runs until `shutdown_rx` fires (or its sender is dropped).
pub fn spawn<S>(
    poll_loop: PollLoop<S>,
    config: WorkerConfig,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()>
where
    S: MetricsSource + Send + 'static,
{
    tokio::spawn(run(poll_loop, config, shutdown_rx))
}

#[instrument(
    name = "worker",
    skip_all,
    fields(poll_interval_ms = config.poll_interval.as_millis() as u64)
)]
async fn run<S: MetricsSource>(
    mut poll_loop: PollLoop<S>,
    config: WorkerConfig,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    let mut cycles_failed: u64 = 0;
    let mut last_stats_log = Instant::now();
    let mut last_no_subscribers_log: Option<Instant> = None;

    loop {
        tokio::select! {
            outcome = poll_loop.run_cycle() => {
                match outcome {
                    CycleOutcome::Published { subscribers: 0, .. } => {
                        let should_log = last_no_subscribers_log
                            .is_none_or(|t| t.elapsed() >= NO_SUBSCRIBERS_LOG_INTERVAL);
                        if should_log {
                            tracing::debug!(
                                operation = "publish",
                                "No active WebSocket subscribers"
                            );
                            last_no_subscribers_log = Some(Instant::now());
                        }
                    }
                    CycleOutcome::Published { .. } => {}
                    _ => cycles_failed += 1,
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("Worker shutting down");
                break;
            }
        }

        if last_stats_log.elapsed() >= config.stats_log_interval {
            let store = poll_loop.store();
            tracing::info!(
                cycles = store.cycles(),
                cycles_failed,
                devices = store.device_count(),
                ports = store.port_count(),
                subscribers = poll_loop.publisher.subscriber_count(),
                "app stats"
            );
            last_stats_log = Instant::now();
        }

        tokio::select! {
            _ = tokio::time::sleep(config.poll_interval) => {}
            _ = &mut shutdown_rx => {
                tracing::debug!("Worker shutting down");
                break;
            }
        }
    }
}
