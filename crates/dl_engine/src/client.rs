use std::path::PathBuf;

use thiserror::Error;

use crate::{Gid, JobStatus};

/// Options forwarded to the engine with a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub out: Option<String>,
    pub dir: Option<PathBuf>,
    pub referer: Option<String>,
    /// Concurrent requests the engine may open for this job.
    pub split: Option<u32>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("engine error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed engine response: {0}")]
    Malformed(String),
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

/// The capability set the orchestrator needs from a download engine.
#[async_trait::async_trait]
pub trait EngineClient: Send + Sync {
    /// Handshake; returns the engine version.
    async fn version(&self) -> Result<String, EngineError>;

    async fn submit(&self, sources: &[String], options: &SubmitOptions) -> Result<Gid, EngineError>;

    /// Status of every given job in one round trip. Unknown identifiers may be
    /// omitted from the result.
    async fn batch_query(&self, gids: &[Gid]) -> Result<Vec<JobStatus>, EngineError>;

    async fn force_shutdown(&self) -> Result<(), EngineError>;
}
