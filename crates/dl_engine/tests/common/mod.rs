#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use dl_engine::{
    EngineClient, EngineError, EngineState, Gid, JobStatus, ProgressObserver, ProgressRenderer,
    SubmitOptions,
};

pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(dl_logging::initialize_for_tests);
}

/// Fails the test instead of hanging when `fut` does not finish in time.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(WAIT, fut)
        .await
        .expect("timed out waiting")
}

/// Polls `check` until it holds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    within(async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}

/// One scripted status report: `(total, completed, state)`.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub total: u64,
    pub completed: u64,
    pub state: EngineState,
}

impl Step {
    pub fn active(total: u64, completed: u64) -> Self {
        Self {
            total,
            completed,
            state: EngineState::Active,
        }
    }

    pub fn complete(total: u64) -> Self {
        Self {
            total,
            completed: total,
            state: EngineState::Complete,
        }
    }

    pub fn error() -> Self {
        Self {
            total: 0,
            completed: 0,
            state: EngineState::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub gid: Gid,
    pub sources: Vec<String>,
    pub options: SubmitOptions,
}

/// In-memory engine. Every job reports the steps scripted for its first
/// source, one per status query, repeating the last one; unscripted jobs stay
/// active at zero bytes.
#[derive(Default)]
pub struct MockEngine {
    next_gid: AtomicUsize,
    submissions: Mutex<Vec<Submission>>,
    scripts: Mutex<HashMap<String, Vec<Step>>>,
    running: Mutex<HashMap<Gid, VecDeque<Step>>>,
    rejected: Mutex<HashSet<String>>,
    failing_queries: AtomicUsize,
    queries: AtomicUsize,
    shutdowns: AtomicUsize,
    unreachable: AtomicBool,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, url: &str, steps: Vec<Step>) {
        self.scripts.lock().unwrap().insert(url.to_string(), steps);
    }

    /// Every listed URL completes on its first status query.
    pub fn finish_instantly(&self, urls: &[&str], size: u64) {
        for url in urls {
            self.script(url, vec![Step::complete(size)]);
        }
    }

    pub fn reject(&self, url: &str) {
        self.rejected.lock().unwrap().insert(url.to_string());
    }

    /// The next `count` batched queries fail.
    pub fn fail_queries(&self, count: usize) {
        self.failing_queries.store(count, Ordering::SeqCst);
    }

    pub fn set_unreachable(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn gid_of(&self, url: &str) -> Option<Gid> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.sources.first().map(String::as_str) == Some(url))
            .map(|s| s.gid.clone())
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineClient for MockEngine {
    async fn version(&self) -> Result<String, EngineError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable("connection refused".into()));
        }
        Ok("mock-1.0".into())
    }

    async fn submit(&self, sources: &[String], options: &SubmitOptions) -> Result<Gid, EngineError> {
        let first = sources.first().cloned().unwrap_or_default();
        if self.rejected.lock().unwrap().contains(&first) {
            return Err(EngineError::Rpc {
                code: 1,
                message: format!("cannot add {first}"),
            });
        }

        let gid = format!("gid-{}", self.next_gid.fetch_add(1, Ordering::SeqCst));
        let steps = self
            .scripts
            .lock()
            .unwrap()
            .get(&first)
            .cloned()
            .unwrap_or_else(|| vec![Step::active(0, 0)]);
        self.running
            .lock()
            .unwrap()
            .insert(gid.clone(), steps.into_iter().collect());
        self.submissions.lock().unwrap().push(Submission {
            gid: gid.clone(),
            sources: sources.to_vec(),
            options: options.clone(),
        });
        Ok(gid)
    }

    async fn batch_query(&self, gids: &[Gid]) -> Result<Vec<JobStatus>, EngineError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_queries.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_queries.store(failing - 1, Ordering::SeqCst);
            return Err(EngineError::Transport("connection reset".into()));
        }

        let mut running = self.running.lock().unwrap();
        let statuses = gids
            .iter()
            .filter_map(|gid| {
                let steps = running.get_mut(gid)?;
                let step = if steps.len() > 1 {
                    steps.pop_front()?
                } else {
                    *steps.front()?
                };
                Some(JobStatus {
                    gid: gid.clone(),
                    completed_length: step.completed,
                    total_length: step.total,
                    download_speed: 0,
                    state: Some(step.state),
                })
            })
            .collect();
        Ok(statuses)
    }

    async fn force_shutdown(&self) -> Result<(), EngineError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Total(u64, bool),
    Current(u64),
    Refill(u64),
    Decay,
    Increment,
}

#[derive(Default)]
pub struct RecordingObserver {
    pub calls: Mutex<Vec<Call>>,
    /// Kept apart from `calls` so call sequences stay comparable.
    pub speeds: Mutex<Vec<u64>>,
}

impl RecordingObserver {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Every total set so far, in order.
    pub fn totals(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Total(total, _) => Some(total),
                _ => None,
            })
            .collect()
    }

    pub fn speeds(&self) -> Vec<u64> {
        self.speeds.lock().unwrap().clone()
    }

    pub fn refills(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Refill(_)))
            .count()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ProgressObserver for RecordingObserver {
    fn set_total(&self, total: u64, complete: bool) {
        self.push(Call::Total(total, complete));
    }

    fn set_current(&self, current: u64) {
        self.push(Call::Current(current));
    }

    fn set_refill(&self, filled: u64) {
        self.push(Call::Refill(filled));
    }

    fn set_speed(&self, bytes_per_sec: u64) {
        self.speeds.lock().unwrap().push(bytes_per_sec);
    }

    fn decay_update(&self, _elapsed: Duration) {
        self.push(Call::Decay);
    }

    fn increment(&self) {
        self.push(Call::Increment);
    }
}

/// Keeps every indicator it hands out, keyed by name or label.
#[derive(Default)]
pub struct RecordingRenderer {
    jobs: Mutex<Vec<(String, bool, Arc<RecordingObserver>)>>,
    tasks: Mutex<Vec<(String, Arc<RecordingObserver>)>>,
}

impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn job(&self, name: &str) -> Option<Arc<RecordingObserver>> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, _, observer)| Arc::clone(observer))
    }

    /// Whether the indicator for `name` is removed on completion.
    pub fn removes_on_complete(&self, name: &str) -> Option<bool> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, remove, _)| *remove)
    }

    pub fn task(&self, label: &str) -> Option<Arc<RecordingObserver>> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, observer)| Arc::clone(observer))
    }
}

impl ProgressRenderer for RecordingRenderer {
    fn job_indicator(
        &self,
        name: &str,
        remove_on_complete: bool,
        _initial_total: u64,
    ) -> Arc<dyn ProgressObserver> {
        let observer = Arc::new(RecordingObserver::default());
        self.jobs
            .lock()
            .unwrap()
            .push((name.to_string(), remove_on_complete, Arc::clone(&observer)));
        observer
    }

    fn task_indicator(
        &self,
        label: &str,
        _operation: &str,
        _total: usize,
    ) -> Option<Arc<dyn ProgressObserver>> {
        if label.is_empty() {
            return None;
        }
        let observer = Arc::new(RecordingObserver::default());
        self.tasks
            .lock()
            .unwrap()
            .push((label.to_string(), Arc::clone(&observer)));
        Some(observer)
    }
}
