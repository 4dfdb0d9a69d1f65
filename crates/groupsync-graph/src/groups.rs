//! Group read and mutation operations.

use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use crate::{GraphClient, GraphError, GraphResult};

/// Maximum member references accepted by one batched add request.
pub const ADD_BATCH_CEILING: usize = 20;

/// Page size for id-only membership listings.
const ID_PAGE_SIZE: usize = 999;

/// A directory group as returned by the Graph API.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupRecord {
    pub id: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
}

/// Leaf object type for transitive membership listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberType {
    User,
    Device,
}

impl MemberType {
    /// OData type-cast segment appended to membership URLs.
    #[must_use]
    pub fn graph_segment(self) -> &'static str {
        match self {
            MemberType::User => "microsoft.graph.user",
            MemberType::Device => "microsoft.graph.device",
        }
    }
}

/// One entry of an unfiltered direct-member listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberRecord {
    #[serde(rename = "@odata.type", default)]
    pub odata_type: String,
    pub id: String,
    #[serde(rename = "deviceId", default)]
    pub device_id: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

impl MemberRecord {
    /// Returns true for user and device members (nested group objects are
    /// neither).
    #[must_use]
    pub fn is_user_or_device(&self) -> bool {
        matches!(
            self.odata_type.as_str(),
            "#microsoft.graph.user" | "#microsoft.graph.device"
        )
    }
}

impl GraphClient {
    /// Fetches a group by object id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the group does not exist; other errors per the retry
    /// protocol.
    #[instrument(skip(self))]
    pub async fn get_group(&self, group_id: &str) -> GraphResult<GroupRecord> {
        let url = format!(
            "{}/groups/{}?$select=id,displayName",
            self.base_url(),
            group_id
        );
        self.get(&url).await
    }

    /// Lists the transitive membership of a group, restricted to one leaf
    /// object type, draining all pages.
    ///
    /// A missing group yields an empty set, not an error.
    #[instrument(skip(self))]
    pub async fn list_transitive_members(
        &self,
        group_id: &str,
        member_type: MemberType,
    ) -> GraphResult<HashSet<String>> {
        let url = format!(
            "{}/groups/{}/transitiveMembers/{}?$select=id&$top={}",
            self.base_url(),
            group_id,
            member_type.graph_segment(),
            ID_PAGE_SIZE
        );

        let mut members = HashSet::new();
        let result = self
            .get_paginated(&url, |page: Vec<serde_json::Value>| {
                for value in page {
                    if let Some(id) = value.get("id").and_then(|v| v.as_str()) {
                        members.insert(id.to_string());
                    }
                }
                Ok(())
            })
            .await;

        match result {
            Ok(()) => Ok(members),
            Err(GraphError::NotFound(url)) => {
                warn!("Group {} not found ({}), treating as empty", group_id, url);
                Ok(HashSet::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Lists the direct members of a group without type filtering,
    /// preserving listing order across pages.
    #[instrument(skip(self))]
    pub async fn list_group_members(&self, group_id: &str) -> GraphResult<Vec<MemberRecord>> {
        let url = format!(
            "{}/groups/{}/members?$select=id,deviceId,displayName&$top={}",
            self.base_url(),
            group_id,
            ID_PAGE_SIZE
        );

        let mut members = Vec::new();
        let result = self
            .get_paginated(&url, |page: Vec<MemberRecord>| {
                members.extend(page);
                Ok(())
            })
            .await;

        match result {
            Ok(()) => Ok(members),
            Err(GraphError::NotFound(url)) => {
                warn!("Group {} not found ({}), treating as empty", group_id, url);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Adds members to a group, splitting the ids into ordered batches of
    /// at most [`ADD_BATCH_CEILING`] references.
    ///
    /// # Errors
    ///
    /// A failing batch aborts the remaining batches and surfaces
    /// `BatchFailed` with the index of the batch that failed; earlier
    /// batches stay applied.
    #[instrument(skip(self, object_ids), fields(count = object_ids.len()))]
    pub async fn add_members(&self, group_id: &str, object_ids: &[String]) -> GraphResult<()> {
        if object_ids.is_empty() {
            return Ok(());
        }

        let url = format!("{}/groups/{}", self.base_url(), group_id);

        for (batch_index, chunk) in object_ids.chunks(ADD_BATCH_CEILING).enumerate() {
            let refs: Vec<String> = chunk
                .iter()
                .map(|oid| format!("{}/directoryObjects/{}", self.base_url(), oid))
                .collect();

            let body = serde_json::json!({ "members@odata.bind": refs });

            debug!(
                "Adding batch {} ({} members) to group {}",
                batch_index,
                chunk.len(),
                group_id
            );

            self.patch(&url, &body)
                .await
                .map_err(|e| GraphError::BatchFailed {
                    batch_index,
                    source: Box::new(e),
                })?;
        }

        info!("Added {} members to group {}", object_ids.len(), group_id);
        Ok(())
    }

    /// Removes one direct member from a group.
    ///
    /// Returns `Ok(false)` when the directory reports the member as absent,
    /// which is what happens for members present only through nested
    /// groups. Direct-member-only removal is a known limitation of the
    /// membership API; destination groups are assumed flat.
    #[instrument(skip(self))]
    pub async fn remove_member(&self, group_id: &str, object_id: &str) -> GraphResult<bool> {
        let url = format!(
            "{}/groups/{}/members/{}/$ref",
            self.base_url(),
            group_id,
            object_id
        );

        match self.delete(&url).await {
            Ok(()) => {
                debug!("Removed member {} from group {}", object_id, group_id);
                Ok(true)
            }
            Err(GraphError::NotFound(_)) => {
                warn!(
                    "Member {} not a direct member of group {}, nothing removed",
                    object_id, group_id
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
