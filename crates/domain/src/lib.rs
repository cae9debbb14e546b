mod alert;
mod commands;
mod errors;
mod models;
mod scan;

pub use alert::{AlertMessage, AlertReport, DeliveryReport};
pub use commands::{AlertTrigger, AppCommand};
pub use errors::AlertError;
pub use models::{
    ActorId, AlertConfig, AttachmentRef, ChannelId, Community, CommunityId, Invoker,
    OriginCandidate, RoleId,
};
pub use scan::{ScanEntry, ScanOutcome, ScanResult};
