mod board;
mod phase_progress;
mod progress;
mod tree;

pub use board::{LoadState, PhaseBoard};
pub use phase_progress::PhaseProgressServiceImpl;
pub use progress::summarize;
pub use tree::build_tree;
