/// One progress reading for a job as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSample {
    pub total: u64,
    pub completed: u64,
}

impl StatusSample {
    pub fn new(total: u64, completed: u64) -> Self {
        Self { total, completed }
    }
}
