use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dl_core::{display_label, short_name, ProgressEffect, MAX_DISPLAY_NAME};
use dl_logging::{dl_debug, dl_info};

/// Total given to a job indicator before the engine reports the real size.
pub const PLACEHOLDER_TOTAL: u64 = 10_000;

/// One progress indicator: a job's transfer, or a callback chain.
pub trait ProgressObserver: Send + Sync {
    /// `complete` marks the indicator finished.
    fn set_total(&self, total: u64, complete: bool);
    fn set_current(&self, current: u64);
    /// Marks the first `filled` units as carried over from an earlier attempt.
    fn set_refill(&self, filled: u64);
    /// Latest transfer rate reported by the engine, in bytes per second.
    fn set_speed(&self, _bytes_per_sec: u64) {}
    fn decay_update(&self, _elapsed: Duration) {}
    fn increment(&self) {}
}

/// Creates indicators; one renderer is shared by a downloader.
pub trait ProgressRenderer: Send + Sync {
    fn job_indicator(
        &self,
        name: &str,
        remove_on_complete: bool,
        initial_total: u64,
    ) -> Arc<dyn ProgressObserver>;

    /// Indicator for a callback chain; `None` when `label` is empty.
    fn task_indicator(
        &self,
        label: &str,
        operation: &str,
        total: usize,
    ) -> Option<Arc<dyn ProgressObserver>>;

    /// Waits for pending output; called once at close.
    fn flush(&self) {}
}

/// Applies reconciled effects to an indicator.
pub fn apply_effects(observer: &dyn ProgressObserver, effects: &[ProgressEffect], period: Duration) {
    for effect in effects {
        match *effect {
            ProgressEffect::SetTotal(total) => observer.set_total(total, false),
            ProgressEffect::Refill(filled) => observer.set_refill(filled),
            ProgressEffect::SetCurrent(current) => observer.set_current(current),
            ProgressEffect::Decay => observer.decay_update(period),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn set_total(&self, _total: u64, _complete: bool) {}
    fn set_current(&self, _current: u64) {}
    fn set_refill(&self, _filled: u64) {}
}

impl ProgressRenderer for NoopRenderer {
    fn job_indicator(&self, _: &str, _: bool, _: u64) -> Arc<dyn ProgressObserver> {
        Arc::new(NoopObserver)
    }

    fn task_indicator(&self, _: &str, _: &str, _: usize) -> Option<Arc<dyn ProgressObserver>> {
        None
    }
}

/// Reports progress through the logging facade instead of a terminal bar.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderer;

impl ProgressRenderer for LogRenderer {
    fn job_indicator(
        &self,
        name: &str,
        remove_on_complete: bool,
        initial_total: u64,
    ) -> Arc<dyn ProgressObserver> {
        Arc::new(LogObserver::new(
            short_name(name, MAX_DISPLAY_NAME),
            remove_on_complete,
            initial_total,
        ))
    }

    fn task_indicator(
        &self,
        label: &str,
        operation: &str,
        total: usize,
    ) -> Option<Arc<dyn ProgressObserver>> {
        if label.is_empty() {
            return None;
        }
        Some(Arc::new(LogObserver::new(
            display_label(label, operation),
            false,
            total as u64,
        )))
    }
}

#[derive(Debug)]
pub struct LogObserver {
    label: String,
    remove_on_complete: bool,
    total: AtomicU64,
    current: AtomicU64,
    speed: AtomicU64,
}

impl LogObserver {
    pub fn new(label: String, remove_on_complete: bool, total: u64) -> Self {
        Self {
            label,
            remove_on_complete,
            total: AtomicU64::new(total),
            current: AtomicU64::new(0),
            speed: AtomicU64::new(0),
        }
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    pub fn speed(&self) -> u64 {
        self.speed.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for LogObserver {
    fn set_total(&self, total: u64, complete: bool) {
        self.total.store(total, Ordering::Relaxed);
        if complete {
            self.current.store(total, Ordering::Relaxed);
            if self.remove_on_complete {
                dl_debug!("{}: done ({} bytes)", self.label, total);
            } else {
                dl_info!("{}: done ({} bytes)", self.label, total);
            }
        }
    }

    fn set_current(&self, current: u64) {
        self.current.store(current, Ordering::Relaxed);
        dl_debug!(
            "{}: {}/{} ({} B/s)",
            self.label,
            current,
            self.total(),
            self.speed()
        );
    }

    fn set_speed(&self, bytes_per_sec: u64) {
        self.speed.store(bytes_per_sec, Ordering::Relaxed);
    }

    fn set_refill(&self, filled: u64) {
        dl_info!("{}: resuming with {} bytes present", self.label, filled);
    }

    fn increment(&self) {
        let done = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        dl_info!("{}: {}/{}", self.label, done, self.total());
    }
}
