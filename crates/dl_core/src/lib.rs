//! dl core: pure progress reconciliation and naming helpers.
mod effect;
mod naming;
mod sample;
mod state;
mod update;

pub use effect::ProgressEffect;
pub use naming::{display_label, extract_name, sanitize_name, short_name, MAX_DISPLAY_NAME};
pub use sample::StatusSample;
pub use state::ProgressState;
pub use update::update;
