use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use dl_logging::{dl_debug, dl_error, dl_info, dl_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::job::{GroupCallback, Job, Jobs};
use crate::progress::ProgressRenderer;
use crate::JobOutcome;

/// What to run once every member of a group finished.
#[derive(Clone, Default)]
pub struct GroupSpec {
    pub label: String,
    pub operation: String,
    /// Member indicators are removed on completion instead of cleared.
    pub replace_bars: bool,
    pub callbacks: Vec<GroupCallback>,
}

impl fmt::Debug for GroupSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupSpec")
            .field("label", &self.label)
            .field("operation", &self.operation)
            .field("replace_bars", &self.replace_bars)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

pub(crate) struct GroupToken {
    index: usize,
    job: Job,
    outcome: JobOutcome,
}

/// A job's link to its group; consumed when the job reports in.
#[derive(Clone)]
pub(crate) struct GroupMember {
    index: usize,
    tx: mpsc::UnboundedSender<GroupToken>,
}

impl GroupMember {
    pub(crate) fn finish(self, mut job: Job, outcome: JobOutcome) {
        // The stored copy must not keep the group's channel open.
        job.group = None;
        let token = GroupToken {
            index: self.index,
            job,
            outcome,
        };
        if self.tx.send(token).is_err() {
            dl_warn!("Group member {} finished after its group was abandoned", self.index);
        }
    }
}

/// Starts one fan-in task per group and keeps them until the downloader closes.
pub(crate) struct GroupCoordinator {
    renderer: Arc<dyn ProgressRenderer>,
    intake: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl GroupCoordinator {
    pub(crate) fn new(renderer: Arc<dyn ProgressRenderer>) -> Self {
        Self {
            renderer,
            intake: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Links every job to a new group and starts its coordination task.
    /// An empty set starts nothing and its callbacks never run.
    pub(crate) fn register(&self, jobs: Jobs, spec: GroupSpec) -> Jobs {
        let members = jobs.len();
        if members == 0 {
            dl_debug!("Ignoring empty group '{}'", spec.label);
            return jobs;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let replace_bars = spec.replace_bars;
        let mut index = 0;
        let jobs = jobs.each(|job| {
            job.group = Some(GroupMember {
                index,
                tx: tx.clone(),
            });
            job.remove_bar = replace_bars;
            index += 1;
        });
        drop(tx);

        let task = tokio::spawn(coordinate(
            rx,
            members,
            spec,
            Arc::clone(&self.renderer),
            self.intake.clone(),
        ));
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
        jobs
    }

    /// Waits for every group. Call only after all workers exited: groups still
    /// short of members then can never complete and are abandoned.
    pub(crate) async fn finish(&self) {
        self.intake.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            if let Err(err) = task.await {
                dl_error!("Group task ended abnormally: {}", err);
            }
        }
    }
}

async fn coordinate(
    mut rx: mpsc::UnboundedReceiver<GroupToken>,
    members: usize,
    spec: GroupSpec,
    renderer: Arc<dyn ProgressRenderer>,
    intake: CancellationToken,
) {
    let mut slots: Vec<Option<Job>> = (0..members).map(|_| None).collect();
    let mut remaining = members;
    let mut failed = 0;

    while remaining > 0 {
        let token = tokio::select! {
            biased;
            token = rx.recv() => token,
            _ = intake.cancelled() => None,
        };
        let Some(token) = token else {
            dl_warn!(
                "Group '{}' abandoned with {} of {} member(s) outstanding",
                spec.label,
                remaining,
                members
            );
            return;
        };

        let slot = &mut slots[token.index];
        if slot.is_some() {
            dl_warn!("Group '{}' member {} reported twice", spec.label, token.index);
            continue;
        }
        if !token.outcome.is_success() {
            failed += 1;
        }
        *slot = Some(token.job);
        remaining -= 1;
    }
    rx.close();

    if failed > 0 {
        dl_warn!(
            "Group '{}': {} of {} member(s) failed, skipping group callbacks",
            spec.label,
            failed,
            members
        );
        return;
    }

    let jobs: Vec<Job> = slots.into_iter().flatten().collect();
    let indicator = renderer.task_indicator(&spec.label, &spec.operation, spec.callbacks.len());
    let label = spec.label.clone();
    let result = tokio::task::spawn_blocking(move || {
        for callback in &spec.callbacks {
            callback(&jobs);
            if let Some(indicator) = &indicator {
                indicator.increment();
            }
        }
    })
    .await;

    match result {
        Ok(()) => dl_info!("Group '{}' callbacks done", label),
        Err(err) => dl_error!("Group '{}' callback panicked: {}", label, err),
    }
}
