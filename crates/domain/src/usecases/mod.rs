//! Application use cases

pub mod pin_workflows;
pub mod topics;

pub use pin_workflows::{PinError, PinWorkflows, ReferenceError};
pub use topics::{
    ListOptions, TopicRunError, TopicUpdater, TopicUpdaterConfig, collect_worklist, needs_update,
    new_topics,
};
