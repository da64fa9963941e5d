use std::sync::Arc;

use dl_logging::{dl_error, dl_info, dl_warn};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::client::EngineClient;
use crate::destination::ensure_output_dir;
use crate::group::{GroupCoordinator, GroupSpec};
use crate::job::Jobs;
use crate::notifier::CompletionNotifier;
use crate::poller::{PollerHandle, StatusPoller};
use crate::progress::ProgressRenderer;
use crate::registry::Registry;
use crate::worker::{spawn_workers, WorkerContext};
use crate::{DownloadError, DownloaderSettings, Job, JobReport};

/// Owns one engine connection and everything that tracks its jobs.
///
/// Jobs are handed to a fixed pool of workers; [`Downloader::close`] drains
/// the queue, waits for workers and groups, then shuts the engine down.
pub struct Downloader {
    settings: DownloaderSettings,
    client: Arc<dyn EngineClient>,
    registry: Arc<Registry>,
    notifier: CompletionNotifier,
    renderer: Arc<dyn ProgressRenderer>,
    groups: GroupCoordinator,
    queue: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    poller: PollerHandle,
    on_complete: Option<mpsc::UnboundedSender<JobReport>>,
}

impl Downloader {
    /// Checks the engine is reachable, then starts workers and the poller.
    ///
    /// An unreachable engine is fatal: no job could make progress.
    pub async fn start(
        settings: DownloaderSettings,
        client: Arc<dyn EngineClient>,
        renderer: Arc<dyn ProgressRenderer>,
    ) -> Result<Self, DownloadError> {
        let version = client
            .version()
            .await
            .map_err(DownloadError::EngineUnavailable)?;
        ensure_output_dir(&settings.base_dir)?;
        dl_info!(
            "Engine {} ready, base dir {:?}, {} workers",
            version,
            settings.base_dir,
            settings.workers()
        );

        let registry = Arc::new(Registry::new());
        let notifier = CompletionNotifier::new(Arc::clone(&registry));
        let poller = StatusPoller::new(
            Arc::clone(&client),
            Arc::clone(&registry),
            notifier.clone(),
            settings.poll_interval(),
        )
        .spawn();

        let (queue, rx) = mpsc::channel(1);
        let ctx = Arc::new(WorkerContext {
            client: Arc::clone(&client),
            registry: Arc::clone(&registry),
            renderer: Arc::clone(&renderer),
        });
        let workers = spawn_workers(settings.workers(), Arc::new(Mutex::new(rx)), ctx);

        Ok(Self {
            groups: GroupCoordinator::new(Arc::clone(&renderer)),
            settings,
            client,
            registry,
            notifier,
            renderer,
            queue,
            workers,
            poller,
            on_complete: None,
        })
    }

    /// Receives a report for every finished job that has no observer of its own.
    pub fn set_on_complete(&mut self, tx: mpsc::UnboundedSender<JobReport>) {
        self.on_complete = Some(tx);
    }

    pub fn settings(&self) -> &DownloaderSettings {
        &self.settings
    }

    /// Handle for the engine's completion event source.
    pub fn notifier(&self) -> CompletionNotifier {
        self.notifier.clone()
    }

    /// Jobs currently submitted to the engine and awaiting completion.
    pub fn active_jobs(&self) -> usize {
        self.registry.len()
    }

    /// Queues jobs for the workers. Waits while every worker is busy.
    pub async fn download(&self, jobs: impl Into<Jobs>) -> Result<(), DownloadError> {
        let jobs: Jobs = jobs.into();
        for job in jobs {
            let job = job.resolve(&self.settings, self.on_complete.as_ref());
            self.queue
                .send(job)
                .await
                .map_err(|_| DownloadError::Closed)?;
        }
        Ok(())
    }

    /// Makes `jobs` one group: once all of them finished, `spec.callbacks`
    /// run once, in order, with the members in their original order.
    ///
    /// The returned jobs still have to be passed to [`Downloader::download`].
    pub fn group(&self, jobs: impl Into<Jobs>, spec: GroupSpec) -> Jobs {
        self.groups.register(jobs.into(), spec)
    }

    /// Drains queued jobs, waits for workers and group callbacks, stops the
    /// poller and force-stops the engine.
    pub async fn close(self) {
        let Self {
            client,
            renderer,
            groups,
            queue,
            workers,
            poller,
            ..
        } = self;

        drop(queue);
        for worker in workers {
            if let Err(err) = worker.await {
                dl_error!("Worker ended abnormally: {}", err);
            }
        }
        groups.finish().await;
        poller.stop().await;
        renderer.flush();

        if let Err(err) = client.force_shutdown().await {
            dl_warn!("Engine force shutdown failed: {}", err);
        }
        dl_info!("Downloader closed");
    }
}
