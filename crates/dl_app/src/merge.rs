use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dl_engine::{GroupCallback, GroupSpec, Job};
use dl_logging::{dl_error, dl_info};

/// Appends `parts` to a fresh `target`, in order. Returns the bytes written.
pub fn concatenate(parts: &[PathBuf], target: &Path) -> io::Result<u64> {
    let mut out = BufWriter::new(File::create(target)?);
    let mut written = 0;
    for part in parts {
        let mut input = File::open(part)?;
        written += io::copy(&mut input, &mut out)?;
    }
    out.flush()?;
    Ok(written)
}

/// A group that joins its members into `target` once every one finished.
/// A failed join raises `failed`.
pub fn merge_group(target: PathBuf, failed: Arc<AtomicBool>) -> GroupSpec {
    let label = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let merge: GroupCallback = Arc::new(move |jobs: &[Job]| {
        let parts: Vec<PathBuf> = jobs.iter().map(Job::destination).collect();
        match concatenate(&parts, &target) {
            Ok(bytes) => dl_info!(
                "Merged {} part(s) into {:?} ({} bytes)",
                parts.len(),
                target,
                bytes
            ),
            Err(err) => {
                dl_error!("Merging into {:?} failed: {}", target, err);
                failed.store(true, Ordering::SeqCst);
            }
        }
    });

    GroupSpec {
        label,
        operation: "merge".to_string(),
        replace_bars: true,
        callbacks: vec![merge],
    }
}
