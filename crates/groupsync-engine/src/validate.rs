//! Group identity validation before mutating use.

use tracing::{debug, instrument, warn};

use groupsync_graph::{GraphClient, GraphError};

use crate::{DirectoryGroup, EngineResult};

/// Confirms that a configured group id resolves to a group whose display
/// name matches exactly (case-sensitive).
///
/// Returns `Ok(false)` on a name mismatch or a missing group; the caller
/// skips the entry and logs. Only an unrecoverable API failure is an
/// error.
#[instrument(skip(graph, group), fields(group_id = %group.id))]
pub async fn validate_group(graph: &GraphClient, group: &DirectoryGroup) -> EngineResult<bool> {
    match graph.get_group(&group.id).await {
        Ok(record) => {
            if record.display_name == group.name {
                debug!("Group {} validated as '{}'", group.id, group.name);
                Ok(true)
            } else {
                warn!(
                    "Group {} display name is '{}', expected '{}'",
                    group.id, record.display_name, group.name
                );
                Ok(false)
            }
        }
        Err(GraphError::NotFound(_)) => {
            warn!("Group {} ('{}') not found", group.id, group.name);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
