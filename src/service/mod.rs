//! Engine services - classification, lifecycle, polling, persistence sync.

mod backup;
mod classifier;
mod lifecycle;
mod poller;

pub use backup::{restore_state, BackupService};
pub use classifier::classify;
pub use lifecycle::{ContestLifecycle, End};
pub use poller::{PollScheduler, PollTasks};
