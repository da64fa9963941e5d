use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dl_app::cli::Args;
use dl_app::config;
use dl_app::merge::merge_group;
use dl_engine::aria2::Aria2Session;
use dl_engine::{Jobs, LogRenderer};
use dl_logging::{dl_error, dl_info};
use log::LevelFilter;
use tokio::sync::mpsc;

const DEFAULT_LOG_PREFIX: &str = "dl";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            dl_error!("{:#}", err);
            eprintln!("dl: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = config::load(args.config.as_deref())?;
    args.apply(&mut config);

    let prefix = match config.downloader.log_prefix.as_str() {
        "" => DEFAULT_LOG_PREFIX,
        prefix => prefix,
    };
    if let Some(path) =
        dl_logging::initialize_file(&dl_logging::default_log_dir(), prefix, LevelFilter::Info)
    {
        eprintln!("Logging to {}", path.display());
    }

    let base_dir = config.downloader.base_dir.clone();
    let mut session = Aria2Session::launch(config.downloader, config.aria2, Arc::new(LogRenderer))
        .await
        .context("failed to start aria2")?;
    let (tx, mut reports) = mpsc::unbounded_channel();
    session.downloader_mut().set_on_complete(tx);

    let merge_failed = Arc::new(AtomicBool::new(false));
    let mut jobs = Jobs::from_urls(&args.urls);
    if let Some(name) = &args.merge {
        let spec = merge_group(base_dir.join(name), Arc::clone(&merge_failed));
        jobs = session.downloader().group(jobs, spec);
    }
    let queued = session.downloader().download(jobs).await;
    session.close().await;
    queued.context("failed to queue downloads")?;

    let mut failed = 0;
    while let Ok(report) = reports.try_recv() {
        if report.outcome.is_success() {
            println!("{}: {}", report.path.display(), report.outcome);
        } else {
            failed += 1;
            eprintln!("{}: {}", report.name, report.outcome);
        }
    }

    if merge_failed.load(Ordering::SeqCst) {
        eprintln!("dl: merging downloads failed");
        failed += 1;
    }

    dl_info!("Finished, {} failure(s)", failed);
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
