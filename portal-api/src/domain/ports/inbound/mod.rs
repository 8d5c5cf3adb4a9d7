mod phase_progress;

pub use phase_progress::*;
