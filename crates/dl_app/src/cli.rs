use std::path::PathBuf;

use clap::Parser;

use crate::config::DlConfig;

#[derive(Debug, Default, PartialEq, Eq, Parser)]
#[command(name = "dl", about = "Download files through a local aria2 instance")]
pub struct Args {
    #[arg(long, help = "RON config file (defaults to ./dl.ron when present)")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Directory downloads are written to")]
    pub dir: Option<PathBuf>,
    #[arg(long, help = "Number of concurrent downloads")]
    pub jobs: Option<usize>,
    /// Join every download, in order, into this file once all finished.
    #[arg(long, value_name = "NAME")]
    pub merge: Option<String>,
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,
}

impl Args {
    /// Command-line values take precedence over the config file.
    pub fn apply(&self, config: &mut DlConfig) {
        if let Some(dir) = &self.dir {
            config.downloader.base_dir = dir.clone();
        }
        if let Some(jobs) = self.jobs {
            config.downloader.max_concurrent_jobs = jobs;
        }
    }
}
