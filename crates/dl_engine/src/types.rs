use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::client::EngineError;

/// Engine-assigned job identifier.
pub type Gid = String;

/// Lifecycle state reported by the engine for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Active,
    Waiting,
    Paused,
    Complete,
    Error,
    Removed,
}

impl EngineState {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "waiting" => Some(Self::Waiting),
            "paused" => Some(Self::Paused),
            "complete" => Some(Self::Complete),
            "error" => Some(Self::Error),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }

    /// The completion event implied by a terminal state, if any.
    pub fn terminal_event(self) -> Option<EventKind> {
        match self {
            Self::Complete => Some(EventKind::Complete),
            Self::Error | Self::Removed => Some(EventKind::Error),
            Self::Active | Self::Waiting | Self::Paused => None,
        }
    }
}

/// One row of a batched status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub gid: Gid,
    pub completed_length: u64,
    pub total_length: u64,
    pub download_speed: u64,
    pub state: Option<EngineState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Complete,
    Error,
}

/// A "job finished" event pushed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub gid: Gid,
    pub kind: EventKind,
}

impl CompletionEvent {
    pub fn complete(gid: impl Into<Gid>) -> Self {
        Self {
            gid: gid.into(),
            kind: EventKind::Complete,
        }
    }

    pub fn error(gid: impl Into<Gid>) -> Self {
        Self {
            gid: gid.into(),
            kind: EventKind::Error,
        }
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    /// The destination was already complete; nothing was submitted.
    AlreadyDownloaded,
    Failed(JobFailure),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, JobOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    /// The engine rejected the submission.
    Submit(String),
    /// The engine reported the transfer as failed.
    Engine,
    /// The completion signal was dropped without being fired.
    Abandoned,
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Completed => write!(f, "completed"),
            JobOutcome::AlreadyDownloaded => write!(f, "already downloaded"),
            JobOutcome::Failed(failure) => write!(f, "failed: {failure}"),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailure::Submit(message) => write!(f, "submission rejected ({message})"),
            JobFailure::Engine => write!(f, "engine reported an error"),
            JobFailure::Abandoned => write!(f, "completion signal dropped"),
        }
    }
}

/// Sent to the job's completion observer once the job and its callbacks finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub name: String,
    pub path: PathBuf,
    pub outcome: JobOutcome,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("a job needs at least one source location")]
    NoSources,
    #[error("engine unavailable: {0}")]
    EngineUnavailable(#[source] EngineError),
    #[error("downloader is closed")]
    Closed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
