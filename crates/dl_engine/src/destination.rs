use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix of the marker the engine keeps next to an unfinished output.
pub const PARTIAL_MARKER_SUFFIX: &str = ".aria2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationState {
    /// Nothing on disk yet.
    Missing,
    /// Output and marker both exist: an interrupted transfer to resume.
    Partial,
    /// Output exists without a marker: nothing left to fetch.
    Complete,
}

impl DestinationState {
    pub fn is_resumable(self) -> bool {
        matches!(self, DestinationState::Partial)
    }
}

/// `{path}.aria2`
pub fn partial_marker(path: &Path) -> PathBuf {
    let mut marker = OsString::from(path.as_os_str());
    marker.push(PARTIAL_MARKER_SUFFIX);
    PathBuf::from(marker)
}

pub fn inspect_destination(path: &Path) -> DestinationState {
    if !path.exists() {
        return DestinationState::Missing;
    }
    if partial_marker(path).exists() {
        DestinationState::Partial
    } else {
        DestinationState::Complete
    }
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        let meta = fs::metadata(dir)?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", dir.display()),
            ));
        }
        return Ok(());
    }
    fs::create_dir_all(dir)
}
