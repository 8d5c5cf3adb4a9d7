mod phase_store;

pub use phase_store::*;
