use std::sync::Arc;
use std::time::Duration;

use dl_core::{update, StatusSample};
use dl_logging::{dl_debug, dl_warn};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::EngineClient;
use crate::notifier::CompletionNotifier;
use crate::progress::apply_effects;
use crate::registry::{lock_record, Registry};
use crate::{CompletionEvent, JobStatus};

/// Periodically reconciles registry progress with the engine.
pub struct StatusPoller {
    client: Arc<dyn EngineClient>,
    registry: Arc<Registry>,
    notifier: CompletionNotifier,
    period: Duration,
}

/// Running poller; stopped by [`PollerHandle::stop`].
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            dl_warn!("Status poller ended abnormally: {}", err);
        }
    }
}

impl StatusPoller {
    pub fn new(
        client: Arc<dyn EngineClient>,
        registry: Arc<Registry>,
        notifier: CompletionNotifier,
        period: Duration,
    ) -> Self {
        Self {
            client,
            registry,
            notifier,
            period,
        }
    }

    pub fn spawn(self) -> PollerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move { self.run(token).await });
        PollerHandle { cancel, task }
    }

    async fn run(self, cancel: CancellationToken) {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }
        dl_debug!("Status poller stopped");
    }

    /// One poll: a single batched query for every active job.
    pub async fn tick(&self) {
        let gids = self.registry.ids();
        if gids.is_empty() {
            return;
        }

        match self.client.batch_query(&gids).await {
            Ok(statuses) => self.apply(&statuses),
            Err(err) => dl_warn!("Batched status query failed: {}", err),
        }
    }

    /// Folds statuses into their records. Statuses for jobs no longer in the
    /// registry, or whose completion already fired, are dropped.
    pub fn apply(&self, statuses: &[JobStatus]) {
        let mut finished = Vec::new();
        for status in statuses {
            let Some(record) = self.registry.get(&status.gid) else {
                continue;
            };

            // The worker finalizes under this lock once signalled.
            let mut record = lock_record(&record);
            if !record.is_pending() {
                continue;
            }
            let sample = StatusSample::new(status.total_length, status.completed_length);
            let (next, effects) = update(record.progress(), sample);
            record.set_progress(next);
            let observer = record.observer();
            observer.set_speed(status.download_speed);
            apply_effects(observer.as_ref(), &effects, self.period);
            drop(record);

            if let Some(kind) = status.state.and_then(|state| state.terminal_event()) {
                finished.push(CompletionEvent {
                    gid: status.gid.clone(),
                    kind,
                });
            }
        }

        // Covers completions that raced ahead of registration.
        if !finished.is_empty() {
            self.notifier.notify(&finished);
        }
    }
}
