//! Run orchestration: Validate, Resolve, Diff, Apply, Report per entry.
//!
//! Entries are processed strictly in configuration order with no
//! concurrency between them; the directory throttles per application and
//! this is an infrequent batch job. A failing entry is logged and counted
//! while the run continues; only authentication exhaustion aborts the run.

use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

use groupsync_graph::GraphClient;

use crate::{
    plan, reconcile, resolver, validate_group, CopyEntry, DeviceFilter, DeviceSyncEntry,
    EngineError, EngineResult, FailureClass, ReconciliationPlan,
};

/// Run-wide options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute and log plans without issuing any mutating call.
    pub dry_run: bool,
}

/// Terminal state of one entry.
#[derive(Debug)]
pub enum EntryStatus {
    /// Reconciled; counts reflect applied changes.
    Synced,
    /// Skipped before any mutation, with the reason.
    Skipped(String),
    /// Failed mid-entry; earlier mutations may have been applied.
    Failed(EngineError),
}

/// Per-entry result surfaced to operators.
#[derive(Debug)]
pub struct EntryOutcome {
    pub label: String,
    pub status: EntryStatus,
    pub added: usize,
    pub removed: usize,
    pub elapsed: Duration,
}

/// Aggregated results of one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<EntryOutcome>,
}

impl RunSummary {
    /// Total members added across all entries.
    #[must_use]
    pub fn total_added(&self) -> usize {
        self.outcomes.iter().map(|o| o.added).sum()
    }

    /// Total members removed across all entries.
    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.outcomes.iter().map(|o| o.removed).sum()
    }

    /// Number of entries that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, EntryStatus::Failed(_)))
            .count()
    }

    /// Number of entries skipped before mutation.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, EntryStatus::Skipped(_)))
            .count()
    }

    /// The most severe failure class across all entries, if any entry did
    /// not sync cleanly. Skipped entries count as validation failures.
    #[must_use]
    pub fn failure_class(&self) -> Option<FailureClass> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                EntryStatus::Synced => None,
                EntryStatus::Skipped(_) => Some(FailureClass::Validation),
                EntryStatus::Failed(e) => Some(e.class()),
            })
            .min()
    }
}

/// Applies a reconciliation plan to a destination group.
///
/// Additions go first, in batches; removals follow one by one. A removal
/// of a nested-only member is a no-op and not counted.
async fn apply_plan(
    graph: &GraphClient,
    group_id: &str,
    plan: &ReconciliationPlan,
    options: SyncOptions,
) -> EngineResult<(usize, usize)> {
    if plan.is_noop() {
        info!("Group {} already converged", group_id);
        return Ok((0, 0));
    }

    if options.dry_run {
        info!(
            "Dry run: would add {} and remove {} members of group {}",
            plan.to_add.len(),
            plan.to_remove.len(),
            group_id
        );
        return Ok((0, 0));
    }

    graph
        .add_members(group_id, &plan.to_add)
        .await
        .map_err(|source| EngineError::AddMembers { source })?;

    let mut removed = 0;
    for object_id in &plan.to_remove {
        if graph
            .remove_member(group_id, object_id)
            .await
            .map_err(|source| EngineError::RemoveMember { source })?
        {
            removed += 1;
        }
    }

    Ok((plan.to_add.len(), removed))
}

/// Processes one device-sync entry through the full state machine.
async fn process_device_entry(
    graph: &GraphClient,
    entry: &DeviceSyncEntry,
    options: SyncOptions,
) -> EngineResult<(EntryStatus, usize, usize)> {
    let filter = match DeviceFilter::from_entry(entry) {
        Ok(filter) => filter,
        Err(EngineError::Validation(reason)) => {
            return Ok((EntryStatus::Skipped(reason), 0, 0));
        }
        Err(e) => return Err(e),
    };

    if !validate_group(graph, &entry.user_group()).await? {
        return Ok((
            EntryStatus::Skipped(format!(
                "user group {} failed name validation",
                entry.user_group_id
            )),
            0,
            0,
        ));
    }
    if !validate_group(graph, &entry.device_group()).await? {
        return Ok((
            EntryStatus::Skipped(format!(
                "device group {} failed name validation",
                entry.device_group_id
            )),
            0,
            0,
        ));
    }

    let desired = resolver::resolve_user_devices(graph, &entry.user_group_id, &filter).await?;
    let current = resolver::resolve_device_members(graph, &entry.device_group_id).await?;

    let plan = plan(&desired, &current, reconcile::Policy::FullReconcile);
    let (added, removed) = apply_plan(graph, &entry.device_group_id, &plan, options).await?;

    Ok((EntryStatus::Synced, added, removed))
}

/// Processes one copy-membership entry; additive-only by policy.
async fn process_copy_entry(
    graph: &GraphClient,
    entry: &CopyEntry,
    options: SyncOptions,
) -> EngineResult<(EntryStatus, usize, usize)> {
    let sources = match entry.source_groups() {
        Ok(sources) => sources,
        Err(EngineError::Validation(reason)) => {
            return Ok((EntryStatus::Skipped(reason), 0, 0));
        }
        Err(e) => return Err(e),
    };

    for source in &sources {
        if !validate_group(graph, source).await? {
            return Ok((
                EntryStatus::Skipped(format!(
                    "source group {} failed name validation",
                    source.id
                )),
                0,
                0,
            ));
        }
    }
    if !validate_group(graph, &entry.destination_group()).await? {
        return Ok((
            EntryStatus::Skipped(format!(
                "destination group {} failed name validation",
                entry.destination_group_id
            )),
            0,
            0,
        ));
    }

    let desired = resolver::resolve_source_union(graph, &sources).await?;

    // Current membership for the additive diff is the destination's own
    // direct member listing; whatever already sits there stays.
    let current: crate::MembershipSet = graph
        .list_group_members(&entry.destination_group_id)
        .await
        .map_err(|source| EngineError::Resolve { source })?
        .into_iter()
        .map(|m| m.id)
        .collect();

    let plan = plan(&desired, &current, reconcile::Policy::AdditiveOnly);
    let (added, removed) = apply_plan(graph, &entry.destination_group_id, &plan, options).await?;

    Ok((EntryStatus::Synced, added, removed))
}

/// Runs all device-sync entries sequentially.
///
/// # Errors
///
/// Only authentication exhaustion (or acquisition failure) is returned;
/// every other per-entry failure is captured in the summary.
#[instrument(skip(graph, entries, options), fields(entries = entries.len()))]
pub async fn run_device_sync(
    graph: &GraphClient,
    entries: &[DeviceSyncEntry],
    options: SyncOptions,
) -> EngineResult<RunSummary> {
    let mut summary = RunSummary::default();

    for entry in entries {
        let label = entry.label();
        let started = Instant::now();
        info!("Processing entry: {}", label);

        match process_device_entry(graph, entry, options).await {
            Ok((status, added, removed)) => {
                report_entry(&mut summary, label, status, added, removed, started.elapsed());
            }
            Err(e) if e.is_auth_fatal() => {
                error!("Authentication exhausted during '{}': {}", label, e);
                return Err(e);
            }
            Err(e) => {
                error!("Entry '{}' failed: {}", label, e);
                summary.outcomes.push(EntryOutcome {
                    label,
                    status: EntryStatus::Failed(e),
                    added: 0,
                    removed: 0,
                    elapsed: started.elapsed(),
                });
            }
        }
    }

    log_summary(&summary);
    Ok(summary)
}

/// Runs all copy-membership entries sequentially. Same failure scoping as
/// [`run_device_sync`].
#[instrument(skip(graph, entries, options), fields(entries = entries.len()))]
pub async fn run_copy_sync(
    graph: &GraphClient,
    entries: &[CopyEntry],
    options: SyncOptions,
) -> EngineResult<RunSummary> {
    let mut summary = RunSummary::default();

    for entry in entries {
        let label = entry.label();
        let started = Instant::now();
        info!("Processing entry: {}", label);

        match process_copy_entry(graph, entry, options).await {
            Ok((status, added, removed)) => {
                report_entry(&mut summary, label, status, added, removed, started.elapsed());
            }
            Err(e) if e.is_auth_fatal() => {
                error!("Authentication exhausted during '{}': {}", label, e);
                return Err(e);
            }
            Err(e) => {
                error!("Entry '{}' failed: {}", label, e);
                summary.outcomes.push(EntryOutcome {
                    label,
                    status: EntryStatus::Failed(e),
                    added: 0,
                    removed: 0,
                    elapsed: started.elapsed(),
                });
            }
        }
    }

    log_summary(&summary);
    Ok(summary)
}

fn report_entry(
    summary: &mut RunSummary,
    label: String,
    status: EntryStatus,
    added: usize,
    removed: usize,
    elapsed: Duration,
) {
    match &status {
        EntryStatus::Synced => {
            info!(
                "Entry '{}' synced: {} added, {} removed in {:.1?}",
                label, added, removed, elapsed
            );
        }
        EntryStatus::Skipped(reason) => {
            warn!("Entry '{}' skipped: {}", label, reason);
        }
        EntryStatus::Failed(_) => {}
    }

    summary.outcomes.push(EntryOutcome {
        label,
        status,
        added,
        removed,
        elapsed,
    });
}

fn log_summary(summary: &RunSummary) {
    info!(
        "Run complete: {} entries, {} added, {} removed, {} skipped, {} failed",
        summary.outcomes.len(),
        summary.total_added(),
        summary.total_removed(),
        summary.skipped(),
        summary.failed()
    );
}
