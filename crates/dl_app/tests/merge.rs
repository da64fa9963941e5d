use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dl_app::merge::{concatenate, merge_group};
use dl_engine::{Job, Jobs};
use tempfile::TempDir;

fn members(temp: &TempDir, urls: &[&str]) -> Vec<Job> {
    Jobs::from_urls(urls.iter().copied())
        .dir(temp.path())
        .into_vec()
}

#[test]
fn parts_are_joined_in_order() {
    let temp = TempDir::new().unwrap();
    let parts: Vec<_> = ["p1", "p2", "p3"]
        .iter()
        .map(|name| temp.path().join(name))
        .collect();
    for (part, body) in parts.iter().zip(["one-", "two-", "three"]) {
        fs::write(part, body).unwrap();
    }
    let target = temp.path().join("joined");

    let written = concatenate(&parts, &target).unwrap();

    assert_eq!(written, 13);
    assert_eq!(fs::read_to_string(&target).unwrap(), "one-two-three");
}

#[test]
fn missing_part_fails() {
    let temp = TempDir::new().unwrap();
    let parts = vec![temp.path().join("nope")];
    assert!(concatenate(&parts, &temp.path().join("joined")).is_err());
}

#[test]
fn merge_group_is_labelled_by_target() {
    let temp = TempDir::new().unwrap();
    let spec = merge_group(temp.path().join("movie.mkv"), Arc::default());

    assert_eq!(spec.label, "movie.mkv");
    assert_eq!(spec.operation, "merge");
    assert!(spec.replace_bars);
    assert_eq!(spec.callbacks.len(), 1);
}

#[test]
fn merge_callback_joins_member_outputs() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a"), "head-").unwrap();
    fs::write(temp.path().join("b"), "tail").unwrap();
    let failed = Arc::new(AtomicBool::new(false));
    let target = temp.path().join("whole");
    let spec = merge_group(target.clone(), Arc::clone(&failed));

    (spec.callbacks[0])(members(&temp, &["http://h/a", "http://h/b"]).as_slice());

    assert_eq!(fs::read_to_string(&target).unwrap(), "head-tail");
    assert!(!failed.load(Ordering::SeqCst));
}

#[test]
fn failed_merge_raises_the_flag() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a"), "head-").unwrap();
    let failed = Arc::new(AtomicBool::new(false));
    let spec = merge_group(temp.path().join("whole"), Arc::clone(&failed));

    // "b" was never written.
    (spec.callbacks[0])(members(&temp, &["http://h/a", "http://h/b"]).as_slice());

    assert!(failed.load(Ordering::SeqCst));
}
