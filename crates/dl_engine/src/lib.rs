//! dl engine: job orchestration over an external download engine.
//!
//! A [`Downloader`] owns a pool of workers draining a submission queue, a
//! registry of active jobs keyed by engine identifier, a completion notifier
//! fed by the engine's event source, a status poller and a group coordinator.
pub mod aria2;
mod client;
mod destination;
mod downloader;
mod group;
mod job;
mod notifier;
mod poller;
mod progress;
mod registry;
mod settings;
mod types;
mod worker;

pub use client::{EngineClient, EngineError, SubmitOptions};
pub use destination::{
    ensure_output_dir, inspect_destination, partial_marker, DestinationState,
    PARTIAL_MARKER_SUFFIX,
};
pub use downloader::Downloader;
pub use group::GroupSpec;
pub use job::{CallbackChain, Cookie, GroupCallback, Job, JobCallback, Jobs};
pub use notifier::CompletionNotifier;
pub use poller::{PollerHandle, StatusPoller};
pub use progress::{
    apply_effects, LogObserver, LogRenderer, NoopObserver, NoopRenderer, ProgressObserver,
    ProgressRenderer, PLACEHOLDER_TOTAL,
};
pub use registry::{lock_record, JobRecord, RecordHandle, Registry, RegistryError};
pub use settings::{
    DownloaderSettings, DEFAULT_MAX_CONCURRENT_JOBS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REQUESTS_PER_JOB,
};
pub use types::{
    CompletionEvent, DownloadError, EngineState, EventKind, Gid, JobFailure, JobOutcome,
    JobReport, JobStatus,
};
