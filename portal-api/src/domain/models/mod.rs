mod confirmation;
mod ids;
mod phase;
mod progress;
mod template;

pub use confirmation::*;
pub use ids::*;
pub use phase::*;
pub use progress::*;
pub use template::*;
