use std::sync::Arc;

use dl_logging::{dl_debug, dl_trace};

use crate::registry::{lock_record, Registry};
use crate::{CompletionEvent, EventKind, JobFailure, JobOutcome};

/// Resolves completion signals from engine events.
///
/// Records are never removed here; the waiting worker removes its own record
/// after it observed the signal. Cheap to clone and safe to call from any
/// number of tasks.
#[derive(Clone)]
pub struct CompletionNotifier {
    registry: Arc<Registry>,
}

impl CompletionNotifier {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Delivers each event to its job. Unknown or already signalled jobs are
    /// skipped. Returns how many signals were delivered.
    pub fn notify(&self, events: &[CompletionEvent]) -> usize {
        let mut delivered = 0;
        for event in events {
            let Some(record) = self.registry.get(&event.gid) else {
                dl_trace!("Ignoring {:?} for unknown job {}", event.kind, event.gid);
                continue;
            };

            let outcome = match event.kind {
                EventKind::Complete => JobOutcome::Completed,
                EventKind::Error => JobOutcome::Failed(JobFailure::Engine),
            };

            if lock_record(&record).signal(outcome) {
                delivered += 1;
            } else {
                dl_debug!("Duplicate {:?} for job {}", event.kind, event.gid);
            }
        }
        delivered
    }
}
