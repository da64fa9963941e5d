use std::sync::Arc;

use dl_logging::{dl_error, dl_info, dl_warn};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::client::EngineClient;
use crate::destination::{inspect_destination, DestinationState};
use crate::job::Job;
use crate::progress::{ProgressRenderer, PLACEHOLDER_TOTAL};
use crate::registry::{lock_record, JobRecord, Registry};
use crate::{JobFailure, JobOutcome, JobReport};

/// Shared receiving end of the submission queue.
pub(crate) type JobQueue = Arc<Mutex<mpsc::Receiver<Job>>>;

pub(crate) struct WorkerContext {
    pub(crate) client: Arc<dyn EngineClient>,
    pub(crate) registry: Arc<Registry>,
    pub(crate) renderer: Arc<dyn ProgressRenderer>,
}

pub(crate) fn spawn_workers(
    count: usize,
    queue: JobQueue,
    ctx: Arc<WorkerContext>,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|id| tokio::spawn(run_worker(id, Arc::clone(&queue), Arc::clone(&ctx))))
        .collect()
}

/// Drains the queue until it is closed and empty.
async fn run_worker(id: usize, queue: JobQueue, ctx: Arc<WorkerContext>) {
    dl_info!("Worker {} started", id);
    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        ctx.process(id, job).await;
    }
    dl_info!("Worker {} stopped", id);
}

impl WorkerContext {
    async fn process(&self, worker: usize, mut job: Job) {
        let outcome = self.transfer(worker, &job).await;

        if outcome.is_success() {
            self.run_callbacks(worker, &job).await;
        } else {
            dl_warn!(
                "Worker {}: {} {}, skipping callbacks",
                worker,
                job.output_name(),
                outcome
            );
        }

        if let Some(tx) = &job.on_complete {
            let report = JobReport {
                name: job.output_name(),
                path: job.destination(),
                outcome: outcome.clone(),
            };
            if tx.send(report).is_err() {
                dl_warn!("Worker {}: completion observer is gone", worker);
            }
        }

        if let Some(member) = job.group.take() {
            member.finish(job, outcome);
        }
    }

    /// Submits the job and waits for its completion signal.
    async fn transfer(&self, worker: usize, job: &Job) -> JobOutcome {
        let name = job.output_name();
        let destination = job.destination();

        let resumed = match inspect_destination(&destination) {
            DestinationState::Complete => {
                dl_info!("Worker {}: {:?} already downloaded", worker, destination);
                return JobOutcome::AlreadyDownloaded;
            }
            state => state.is_resumable(),
        };

        let gid = match self.client.submit(job.sources(), &job.submit_options()).await {
            Ok(gid) => gid,
            Err(err) => {
                dl_error!("Worker {}: submitting {} failed: {}", worker, name, err);
                return JobOutcome::Failed(JobFailure::Submit(err.to_string()));
            }
        };

        let observer = self
            .renderer
            .job_indicator(&name, job.remove_bar, PLACEHOLDER_TOTAL);
        let (record, done) = JobRecord::new(resumed, Arc::clone(&observer));
        let handle = match self.registry.put(gid.clone(), record) {
            Ok(handle) => handle,
            Err(err) => {
                dl_error!("Worker {}: {}", worker, err);
                return JobOutcome::Failed(JobFailure::Submit(err.to_string()));
            }
        };
        dl_info!(
            "Worker {}: {} submitted as {}{}",
            worker,
            name,
            gid,
            if resumed { " (resuming)" } else { "" }
        );

        let outcome = done
            .await
            .unwrap_or(JobOutcome::Failed(JobFailure::Abandoned));

        {
            let record = lock_record(&handle);
            observer.set_total(record.progress().final_total(), true);
        }
        self.registry.remove(&gid);
        dl_info!("Worker {}: {} {}", worker, name, outcome);
        outcome
    }

    async fn run_callbacks(&self, worker: usize, job: &Job) {
        if job.callbacks.is_empty() {
            return;
        }

        let indicator = self.renderer.task_indicator(
            &job.callbacks.label,
            &job.callbacks.operation,
            job.callbacks.fns.len(),
        );
        let job = job.clone();
        let result = tokio::task::spawn_blocking(move || {
            for callback in &job.callbacks.fns {
                callback(&job);
                if let Some(indicator) = &indicator {
                    indicator.increment();
                }
            }
        })
        .await;

        match result {
            Ok(()) => dl_info!("Worker {}: called callback functions", worker),
            Err(err) => dl_error!("Worker {}: callback panicked: {}", worker, err),
        }
    }
}
