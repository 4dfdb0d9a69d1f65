//! Membership resolution against the directory.

use tracing::{debug, info, instrument};

use groupsync_graph::{GraphClient, MemberType};

use crate::{DeviceFilter, DirectoryGroup, EngineError, EngineResult, MembershipSet};

/// Resolves the desired device set for a user group: every device owned by
/// a transitive user member that survives the attribute filter.
#[instrument(skip(graph, filter))]
pub async fn resolve_user_devices(
    graph: &GraphClient,
    user_group_id: &str,
    filter: &DeviceFilter,
) -> EngineResult<MembershipSet> {
    let users = graph
        .list_transitive_members(user_group_id, MemberType::User)
        .await
        .map_err(|source| EngineError::Resolve { source })?;

    debug!("Group {} has {} transitive users", user_group_id, users.len());

    let mut devices = MembershipSet::new();
    for user_id in &users {
        let owned = graph
            .list_user_owned_devices(user_id)
            .await
            .map_err(|source| EngineError::Resolve { source })?;

        for device in owned {
            if filter.matches(&device) {
                devices.insert(device.id);
            }
        }
    }

    info!(
        "Resolved {} eligible devices from {} users of group {}",
        devices.len(),
        users.len(),
        user_group_id
    );
    Ok(devices)
}

/// Resolves the current device membership of a device group.
#[instrument(skip(graph))]
pub async fn resolve_device_members(
    graph: &GraphClient,
    device_group_id: &str,
) -> EngineResult<MembershipSet> {
    graph
        .list_transitive_members(device_group_id, MemberType::Device)
        .await
        .map_err(|source| EngineError::Resolve { source })
}

/// Resolves the union of user and device members across source groups for
/// the copy-membership variant. Nested group objects are reported and
/// skipped; only leaf members are copied.
#[instrument(skip(graph, sources))]
pub async fn resolve_source_union(
    graph: &GraphClient,
    sources: &[DirectoryGroup],
) -> EngineResult<MembershipSet> {
    let mut union = MembershipSet::new();

    for source in sources {
        let members = graph
            .list_group_members(&source.id)
            .await
            .map_err(|source| EngineError::Resolve { source })?;

        let mut skipped = 0;
        for member in members {
            if member.is_user_or_device() {
                union.insert(member.id);
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            debug!(
                "Skipped {} non-leaf members of source group {}",
                skipped, source.id
            );
        }
    }

    info!(
        "Resolved {} members across {} source groups",
        union.len(),
        sources.len()
    );
    Ok(union)
}
