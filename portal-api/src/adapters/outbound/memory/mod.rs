mod phases;

pub use phases::InMemoryPhaseStore;
