use std::sync::Arc;
use std::time::{Duration, Instant};

use dl_logging::{dl_debug, dl_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::notifications::{connect, spawn_listener};
use super::process::Aria2Process;
use super::rpc::Aria2Client;
use super::{Aria2Error, Aria2Settings};
use crate::client::EngineClient;
use crate::progress::ProgressRenderer;
use crate::{Downloader, DownloaderSettings};

const READY_POLL: Duration = Duration::from_millis(100);
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// A [`Downloader`] wired to an aria2 process it launched itself.
pub struct Aria2Session {
    downloader: Downloader,
    process: Aria2Process,
    listener: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Aria2Session {
    /// Starts aria2, waits for its RPC endpoint, subscribes to notifications
    /// and starts the downloader.
    pub async fn launch(
        settings: DownloaderSettings,
        aria2: Aria2Settings,
        renderer: Arc<dyn ProgressRenderer>,
    ) -> Result<Self, Aria2Error> {
        let process = Aria2Process::spawn(&aria2, settings.workers())?;
        let client = Arc::new(Aria2Client::new(process.rpc_url(), process.secret())?);
        wait_ready(client.as_ref(), aria2.startup_timeout()).await?;

        let stream = connect(&process.ws_url()).await?;
        let downloader = Downloader::start(settings, client, renderer).await?;
        let cancel = CancellationToken::new();
        let listener = spawn_listener(stream, downloader.notifier(), cancel.clone());

        Ok(Self {
            downloader,
            process,
            listener,
            cancel,
        })
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    pub fn downloader_mut(&mut self) -> &mut Downloader {
        &mut self.downloader
    }

    /// Closes the downloader, then stops listening and reaps the process.
    pub async fn close(self) {
        self.downloader.close().await;
        self.cancel.cancel();
        if let Err(err) = self.listener.await {
            dl_warn!("Notification listener ended abnormally: {}", err);
        }
        self.process.shutdown(EXIT_GRACE).await;
    }
}

/// Retries the version handshake until the engine answers or `timeout` passes.
async fn wait_ready(client: &dyn EngineClient, timeout: Duration) -> Result<(), Aria2Error> {
    let started = Instant::now();
    loop {
        match client.version().await {
            Ok(version) => {
                dl_debug!("aria2 {} answered after {:?}", version, started.elapsed());
                return Ok(());
            }
            Err(err) if started.elapsed() >= timeout => {
                return Err(Aria2Error::Handshake {
                    waited: timeout,
                    source: err,
                });
            }
            Err(_) => tokio::time::sleep(READY_POLL).await,
        }
    }
}
