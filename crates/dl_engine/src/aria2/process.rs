use std::net::TcpListener;
use std::process::Stdio;
use std::time::Duration;

use dl_logging::{dl_info, dl_warn};
use tokio::process::{Child, Command};

use super::{Aria2Error, Aria2Settings};

/// Asks the OS for an unused port on `host`. The port is released before
/// returning, so another process could claim it first.
pub fn free_port(host: &str) -> Result<u16, Aria2Error> {
    let listener = TcpListener::bind((host, 0)).map_err(Aria2Error::Port)?;
    let port = listener.local_addr().map_err(Aria2Error::Port)?.port();
    Ok(port)
}

/// Command-line arguments for an RPC-enabled aria2 instance.
pub fn launch_args(
    settings: &Aria2Settings,
    port: u16,
    secret: &str,
    max_concurrent: usize,
) -> Vec<String> {
    let mut args = settings.extra_args.clone();
    args.extend([
        format!("--rpc-listen-port={port}"),
        format!("--max-concurrent-downloads={max_concurrent}"),
        "--enable-rpc".to_string(),
        "--rpc-listen-all".to_string(),
        format!("--rpc-secret={secret}"),
    ]);
    args
}

/// A running aria2 child process.
pub struct Aria2Process {
    child: Child,
    host: String,
    port: u16,
    secret: String,
}

impl Aria2Process {
    /// Starts aria2 on a free port with a fresh RPC secret.
    pub fn spawn(settings: &Aria2Settings, max_concurrent: usize) -> Result<Self, Aria2Error> {
        let port = free_port(&settings.host)?;
        let secret = uuid::Uuid::new_v4().simple().to_string();
        let args = launch_args(settings, port, &secret, max_concurrent);

        let child = Command::new(&settings.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Aria2Error::Launch {
                binary: settings.binary.display().to_string(),
                source,
            })?;
        dl_info!(
            "Started {} (pid {:?}) on port {}",
            settings.binary.display(),
            child.id(),
            port
        );

        Ok(Self {
            child,
            host: settings.host.clone(),
            port,
            secret,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn rpc_url(&self) -> String {
        format!("http://{}:{}/jsonrpc", self.host, self.port)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}/jsonrpc", self.host, self.port)
    }

    /// Waits up to `grace` for the process to exit, then kills it.
    pub async fn shutdown(mut self, grace: Duration) {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => dl_info!("aria2 exited with {}", status),
            Ok(Err(err)) => dl_warn!("Waiting for aria2 failed: {}", err),
            Err(_) => {
                dl_warn!("aria2 still running after {:?}, killing it", grace);
                if let Err(err) = self.child.kill().await {
                    dl_warn!("Killing aria2 failed: {}", err);
                }
            }
        }
    }
}
