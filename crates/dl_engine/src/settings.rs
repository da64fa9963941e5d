use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 3;
pub const DEFAULT_REQUESTS_PER_JOB: u32 = 3;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderSettings {
    /// Job directories are resolved relative to this.
    pub base_dir: PathBuf,
    pub max_concurrent_jobs: usize,
    pub requests_per_job: u32,
    pub poll_interval_ms: u64,
    pub log_prefix: String,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            requests_per_job: DEFAULT_REQUESTS_PER_JOB,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            log_prefix: String::new(),
        }
    }
}

impl DownloaderSettings {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn workers(&self) -> usize {
        if self.max_concurrent_jobs == 0 {
            DEFAULT_MAX_CONCURRENT_JOBS
        } else {
            self.max_concurrent_jobs
        }
    }

    pub fn requests(&self) -> u32 {
        if self.requests_per_job == 0 {
            DEFAULT_REQUESTS_PER_JOB
        } else {
            self.requests_per_job
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
