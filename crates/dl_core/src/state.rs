/// Last known progress of one active job.
///
/// `total` only ever grows, and the resume refill is recorded at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressState {
    total: u64,
    completed: u64,
    resumed: bool,
    refilled: bool,
}

impl ProgressState {
    pub fn new(resumed: bool) -> Self {
        Self {
            resumed,
            ..Self::default()
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn resumed(&self) -> bool {
        self.resumed
    }

    pub fn refilled(&self) -> bool {
        self.refilled
    }

    /// Size to show once the job has finished: the larger of total and completed.
    pub fn final_total(&self) -> u64 {
        self.total.max(self.completed)
    }

    pub(crate) fn raise_total(&mut self, total: u64) -> bool {
        if total >= self.total {
            self.total = total;
            true
        } else {
            false
        }
    }

    pub(crate) fn take_refill(&mut self) -> bool {
        if self.resumed && !self.refilled {
            self.refilled = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn set_completed(&mut self, completed: u64) {
        self.completed = completed;
    }
}
