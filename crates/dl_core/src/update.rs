use crate::{ProgressEffect, ProgressState, StatusSample};

/// Pure update function: applies an engine sample to a job's progress and
/// returns the indicator effects, in the order they must be applied.
pub fn update(mut state: ProgressState, sample: StatusSample) -> (ProgressState, Vec<ProgressEffect>) {
    let mut effects = Vec::with_capacity(4);

    // Early reports may be partial; a smaller total never replaces a larger one.
    if state.raise_total(sample.total) {
        effects.push(ProgressEffect::SetTotal(sample.total));
    }

    if state.take_refill() {
        effects.push(ProgressEffect::Refill(sample.completed));
    }

    state.set_completed(sample.completed);
    effects.push(ProgressEffect::SetCurrent(sample.completed));
    effects.push(ProgressEffect::Decay);

    (state, effects)
}
