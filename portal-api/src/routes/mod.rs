pub(crate) mod error;
pub(crate) mod phases;
pub(crate) mod template;

pub(crate) use error::ApiError;
