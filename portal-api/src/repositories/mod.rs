mod phase_repo;
mod repo_error;

pub use phase_repo::*;
pub use repo_error::RepositoryError;
