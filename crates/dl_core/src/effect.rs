/// Instructions for a progress indicator, produced by [`crate::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEffect {
    /// Replace the indicator's total length.
    SetTotal(u64),
    /// Mark the first `n` bytes as already present from an earlier attempt.
    Refill(u64),
    /// Move the indicator to `n` completed bytes.
    SetCurrent(u64),
    /// Feed one poll period into the speed average.
    Decay,
}
