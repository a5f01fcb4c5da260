//! Background index refresher

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::AlumniRagService;

/// Rebuilds the index when the store has moved past the watermark.
///
/// Woken by queries that observe a stale index and, when configured, by a
/// periodic poll.
pub struct IndexRefresher {
    service: Arc<AlumniRagService>,
    poll: Option<Duration>,
}

impl IndexRefresher {
    pub fn new(service: Arc<AlumniRagService>) -> Self {
        let secs = service.config().refresh.interval_secs;
        let poll = (secs > 0).then(|| Duration::from_secs(secs));
        Self { service, poll }
    }

    /// Run until `shutdown` flips to true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Index refresher started (poll: {})",
            self.poll
                .map(|p| format!("{}s", p.as_secs()))
                .unwrap_or_else(|| "off".to_string())
        );

        let mut ticker = self.poll.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                _ = self.service.refresh_signal().notified() => {}
                _ = tick(&mut ticker) => {}
            }

            match self.service.refresh_if_stale().await {
                Ok(true) => tracing::info!(
                    "Index refreshed to generation {}",
                    self.service.index().generation()
                ),
                Ok(false) => tracing::debug!("Index already fresh"),
                Err(e) => tracing::warn!("Index refresh failed: {}", e),
            }
        }

        tracing::info!("Index refresher stopped");
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Handle to a spawned refresher
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signal the refresher and wait for it to finish its current pass
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Index refresher task failed: {}", e);
        }
    }
}

/// Spawn the refresher on the current runtime
pub fn spawn_refresher(service: Arc<AlumniRagService>) -> RefreshHandle {
    let (shutdown, receiver) = watch::channel(false);
    let task = tokio::spawn(IndexRefresher::new(service).run(receiver));
    RefreshHandle { shutdown, task }
}
