//! Group reconciliation engine for groupsync.
//!
//! Given configuration entries naming source and destination Entra ID
//! groups, the engine resolves current and desired membership through the
//! directory, diffs the two sets, and applies the difference as batched
//! idempotent add/remove operations. Two variants share the machinery:
//! device-group-from-user-group (full reconcile with attribute filters)
//! and copy-membership (additive-only).
//!
//! The remote directory is the sole source of truth; a re-run after any
//! interruption converges to the same desired state.

mod config;
mod error;
mod filter;
mod reconcile;
pub mod resolver;
mod run;
mod validate;

// Re-exports
pub use config::{fetch_entries, CopyEntry, DeviceSyncEntry, DirectoryGroup};
pub use error::{EngineError, EngineResult, FailureClass};
pub use filter::{DeviceFilter, OperatingSystem, TriState, TrustType};
pub use reconcile::{diff, plan, MembershipSet, Policy, ReconciliationPlan};
pub use run::{run_copy_sync, run_device_sync, EntryOutcome, EntryStatus, RunSummary, SyncOptions};
pub use validate::validate_group;
