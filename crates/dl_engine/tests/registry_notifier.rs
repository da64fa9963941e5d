mod common;

use std::sync::Arc;

use common::{init_logging, RecordingObserver};
use dl_engine::{
    lock_record, CompletionEvent, CompletionNotifier, JobFailure, JobOutcome, JobRecord, Registry,
    RegistryError,
};
use pretty_assertions::assert_eq;

fn record() -> (JobRecord, tokio::sync::oneshot::Receiver<JobOutcome>) {
    JobRecord::new(false, Arc::new(RecordingObserver::default()))
}

#[test]
fn put_rejects_duplicate_ids() {
    init_logging();
    let registry = Registry::new();
    let (first, _rx1) = record();
    let (second, _rx2) = record();

    registry.put("a".into(), first).unwrap();
    let err = registry.put("a".into(), second).unwrap_err();

    assert_eq!(err, RegistryError::DuplicateId("a".into()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn removed_record_stays_readable_through_handle() {
    init_logging();
    let registry = Registry::new();
    let (rec, _rx) = record();
    registry.put("a".into(), rec).unwrap();

    let snapshot = registry.snapshot();
    assert!(registry.remove("a").is_some());
    assert!(registry.remove("a").is_none());
    assert!(registry.is_empty());

    let (gid, handle) = &snapshot[0];
    assert_eq!(gid, "a");
    assert!(lock_record(handle).is_pending());
}

#[tokio::test]
async fn notifier_signals_each_job_once() {
    init_logging();
    let registry = Arc::new(Registry::new());
    let notifier = CompletionNotifier::new(Arc::clone(&registry));
    let (rec, rx) = record();
    registry.put("a".into(), rec).unwrap();

    let delivered = notifier.notify(&[
        CompletionEvent::complete("a"),
        CompletionEvent::error("a"),
    ]);

    assert_eq!(delivered, 1);
    assert_eq!(rx.await.unwrap(), JobOutcome::Completed);
    // The notifier leaves removal to the waiting worker.
    assert!(registry.contains("a"));
    assert!(!lock_record(&registry.get("a").unwrap()).is_pending());
}

#[tokio::test]
async fn error_event_fails_the_job() {
    init_logging();
    let registry = Arc::new(Registry::new());
    let notifier = CompletionNotifier::new(Arc::clone(&registry));
    let (rec, rx) = record();
    registry.put("b".into(), rec).unwrap();

    assert_eq!(notifier.notify(&[CompletionEvent::error("b")]), 1);
    assert_eq!(rx.await.unwrap(), JobOutcome::Failed(JobFailure::Engine));
}

#[test]
fn unknown_ids_are_ignored() {
    init_logging();
    let registry = Arc::new(Registry::new());
    let notifier = CompletionNotifier::new(Arc::clone(&registry));
    let (rec, _rx) = record();
    registry.put("known".into(), rec).unwrap();

    let delivered = notifier.notify(&[
        CompletionEvent::complete("ghost"),
        CompletionEvent::complete("known"),
    ]);

    assert_eq!(delivered, 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn signal_after_receiver_dropped_reports_undelivered() {
    init_logging();
    let (mut rec, rx) = record();
    drop(rx);

    assert!(!rec.signal(JobOutcome::Completed));
    assert!(!rec.is_pending());
}
