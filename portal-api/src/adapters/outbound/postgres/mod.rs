mod phases;

pub use phases::PostgresPhaseStore;
