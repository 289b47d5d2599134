//! Concurrent ownership checking and progress reporting.

pub mod checker;
pub mod progress;

pub use checker::{check_entry, CheckerError, CheckerOptions, OutputOrder, OwnershipChecker, RunSummary};
pub use progress::{ProgressSnapshot, ProgressTracker};
