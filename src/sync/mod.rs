//! Tree reconciliation engine.
//!
//! [`Synchronizer`] drives a work-list over pairs of source and destination
//! directories, diffs each level by name with [`diff_nodes`] and hands the
//! resulting creates, copies and deletes to the mutation executor. Every
//! operation is reported to an [`OperationLog`] in the order it runs.

mod case_guard;
mod diff;
mod listing;
mod mutation;
mod operation;
mod options;
mod progress;
mod scheduler;
mod work_list;

pub use case_guard::{CaseGuardError, check_case_collisions};
pub use diff::{DiffLevel, DiffResult, diff_nodes};
pub use listing::{ListingError, list_files};
pub use operation::{ConsoleLog, Operation, OperationLog};
pub use options::SyncOptions;
pub use scheduler::{SyncError, Synchronizer};
pub use work_list::{Pending, WorkList};
