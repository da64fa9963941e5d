use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

use dl_core::extract_name;
use tokio::sync::mpsc;

use crate::group::GroupMember;
use crate::{DownloadError, DownloaderSettings, JobReport, SubmitOptions};

/// Runs after a job finished successfully.
pub type JobCallback = Arc<dyn Fn(&Job) + Send + Sync>;

/// Runs once after every member of a group finished successfully.
pub type GroupCallback = Arc<dyn Fn(&[Job]) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Callbacks run in order after a job, with an optional indicator label.
#[derive(Clone, Default)]
pub struct CallbackChain {
    pub label: String,
    pub operation: String,
    pub fns: Vec<JobCallback>,
}

impl CallbackChain {
    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }
}

impl fmt::Debug for CallbackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackChain")
            .field("label", &self.label)
            .field("operation", &self.operation)
            .field("fns", &self.fns.len())
            .finish()
    }
}

/// One logical output fetched from one or more mirrors.
#[derive(Clone)]
pub struct Job {
    /// Mirrors of the same file, never empty.
    sources: Vec<String>,
    /// Output name; derived from the first source when unset.
    pub name: Option<String>,
    pub dir: PathBuf,
    pub referer: Option<String>,
    /// Accepted but not forwarded to the engine yet.
    pub cookies: Vec<Cookie>,
    /// Concurrent requests per job; the downloader default applies when unset.
    pub requests: Option<u32>,
    pub callbacks: CallbackChain,
    /// Remove the progress indicator on completion instead of clearing it.
    pub remove_bar: bool,
    pub(crate) on_complete: Option<mpsc::UnboundedSender<JobReport>>,
    pub(crate) group: Option<GroupMember>,
}

impl Job {
    pub fn new<I, S>(sources: I) -> Result<Self, DownloadError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = sources.into_iter().map(Into::into).collect();
        if sources.is_empty() {
            return Err(DownloadError::NoSources);
        }
        Ok(Self::with_sources(sources))
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self::with_sources(vec![url.into()])
    }

    fn with_sources(sources: Vec<String>) -> Self {
        Self {
            sources,
            name: None,
            dir: PathBuf::new(),
            referer: None,
            cookies: Vec::new(),
            requests: None,
            callbacks: CallbackChain::default(),
            remove_bar: false,
            on_complete: None,
            group: None,
        }
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// The explicit name, or the one derived from the first source.
    pub fn output_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => extract_name(&self.sources[0]),
        }
    }

    /// `dir/name`, where the engine writes the output.
    pub fn destination(&self) -> PathBuf {
        self.dir.join(self.output_name())
    }

    pub fn is_grouped(&self) -> bool {
        self.group.is_some()
    }

    pub(crate) fn submit_options(&self) -> SubmitOptions {
        // TODO: forward `cookies` as a `Cookie:` header option once header merging with
        // user-supplied engine args is settled.
        SubmitOptions {
            out: Some(self.output_name()),
            dir: (!self.dir.as_os_str().is_empty()).then(|| self.dir.clone()),
            referer: self.referer.clone(),
            split: self.requests,
        }
    }

    /// Fills defaults from the downloader: name, base directory, request count
    /// and completion observer.
    pub(crate) fn resolve(
        mut self,
        settings: &DownloaderSettings,
        default_on_complete: Option<&mpsc::UnboundedSender<JobReport>>,
    ) -> Self {
        if self.name.is_none() {
            self.name = Some(extract_name(&self.sources[0]));
        }
        if self.requests.unwrap_or(0) == 0 {
            self.requests = Some(settings.requests());
        }
        if self.on_complete.is_none() {
            self.on_complete = default_on_complete.cloned();
        }
        self.dir = if self.dir.as_os_str().is_empty() {
            settings.base_dir.clone()
        } else {
            settings.base_dir.join(&self.dir)
        };
        self
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("sources", &self.sources)
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("referer", &self.referer)
            .field("cookies", &self.cookies.len())
            .field("requests", &self.requests)
            .field("callbacks", &self.callbacks)
            .field("remove_bar", &self.remove_bar)
            .field("grouped", &self.group.is_some())
            .finish()
    }
}

/// An ordered set of jobs with chainable setters applied to every member.
#[derive(Debug, Clone, Default)]
pub struct Jobs(Vec<Job>);

impl Jobs {
    /// One job per URL.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(urls.into_iter().map(Job::from_url).collect())
    }

    /// One job per mirror list.
    pub fn from_mirrors<I, M, S>(mirrors: I) -> Result<Self, DownloadError>
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        mirrors
            .into_iter()
            .map(Job::new)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn dir(self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.each(|job| job.dir = dir.clone())
    }

    pub fn referer(self, referer: impl Into<String>) -> Self {
        let referer = referer.into();
        self.each(|job| job.referer = Some(referer.clone()))
    }

    pub fn cookies(self, cookies: Vec<Cookie>) -> Self {
        self.each(|job| job.cookies = cookies.clone())
    }

    pub fn requests(self, requests: u32) -> Self {
        self.each(|job| job.requests = Some(requests))
    }

    pub fn on_complete(self, tx: mpsc::UnboundedSender<JobReport>) -> Self {
        self.each(|job| job.on_complete = Some(tx.clone()))
    }

    /// Sets the per-job callback chain of every member.
    pub fn callbacks(
        self,
        label: impl Into<String>,
        operation: impl Into<String>,
        fns: Vec<JobCallback>,
    ) -> Self {
        let chain = CallbackChain {
            label: label.into(),
            operation: operation.into(),
            fns,
        };
        self.each(|job| job.callbacks = chain.clone())
    }

    pub fn push(&mut self, job: Job) {
        self.0.push(job);
    }

    pub fn into_vec(self) -> Vec<Job> {
        self.0
    }

    pub(crate) fn each(mut self, mut f: impl FnMut(&mut Job)) -> Self {
        self.0.iter_mut().for_each(&mut f);
        self
    }
}

impl Deref for Jobs {
    type Target = [Job];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Job> for Jobs {
    fn from(job: Job) -> Self {
        Self(vec![job])
    }
}

impl From<Vec<Job>> for Jobs {
    fn from(jobs: Vec<Job>) -> Self {
        Self(jobs)
    }
}

impl FromIterator<Job> for Jobs {
    fn from_iter<T: IntoIterator<Item = Job>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Jobs {
    type Item = Job;
    type IntoIter = std::vec::IntoIter<Job>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
