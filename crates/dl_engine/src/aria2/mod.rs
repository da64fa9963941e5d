//! aria2 as the download engine: process launch, HTTP JSON-RPC and WebSocket
//! notifications.

mod notifications;
mod process;
mod rpc;
mod session;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::EngineError;
use crate::DownloadError;

pub use notifications::{connect, parse_notification, spawn_listener, NotificationStream};
pub use process::{free_port, launch_args, Aria2Process};
pub use rpc::{parse_multicall_statuses, to_aria2_options, Aria2Client, STATUS_KEYS};
pub use session::Aria2Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Aria2Settings {
    pub binary: PathBuf,
    /// Passed to aria2 before the RPC arguments.
    pub extra_args: Vec<String>,
    pub host: String,
    pub startup_timeout_ms: u64,
}

impl Default for Aria2Settings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("aria2c"),
            extra_args: Vec::new(),
            host: "127.0.0.1".to_string(),
            startup_timeout_ms: 5_000,
        }
    }
}

impl Aria2Settings {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }
}

#[derive(Debug, Error)]
pub enum Aria2Error {
    #[error("no free port: {0}")]
    Port(#[source] std::io::Error),
    #[error("failed to launch {binary}: {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("aria2 did not answer within {waited:?}: {source}")]
    Handshake {
        waited: Duration,
        #[source]
        source: EngineError,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}
