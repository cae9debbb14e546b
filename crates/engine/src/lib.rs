mod compose;
mod dispatch;
mod origin;
mod pipeline;
mod probe;
mod scan;
mod traits;

pub use compose::compose;
pub use dispatch::broadcast;
pub use origin::resolve_origin;
pub use pipeline::AlertPipeline;
pub use probe::probe;
pub use scan::{scan, DEFAULT_SCAN_DEADLINE};
pub use traits::{Membership, Messenger, Selector};

#[cfg(test)]
pub(crate) mod testutil;
