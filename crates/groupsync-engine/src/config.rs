//! Remote configuration entries.
//!
//! The configuration document is a JSON array fetched from a URL. Field
//! names are an external contract shared with the operators who maintain
//! the document; they are preserved verbatim through serde renames.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::{EngineError, EngineResult};

/// A directory group as named in configuration: the opaque object id plus
/// the display name it must resolve to before any mutating use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    pub id: String,
    pub name: String,
}

impl DirectoryGroup {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One device-sync entry: derive device-group membership from the
/// transitive user membership of a source group.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSyncEntry {
    #[serde(rename = "UserAzureADGroupId")]
    pub user_group_id: String,
    #[serde(rename = "UserAzureADGroupName")]
    pub user_group_name: String,
    #[serde(rename = "DeviceAzureADGroupId")]
    pub device_group_id: String,
    #[serde(rename = "DeviceAzureADGroupName")]
    pub device_group_name: String,
    #[serde(rename = "OSList", default)]
    pub os_list: Option<Vec<String>>,
    #[serde(rename = "TrustTypeList", default)]
    pub trust_type_list: Option<Vec<String>>,
    #[serde(rename = "isCompliant", default)]
    pub is_compliant: Option<String>,
    #[serde(rename = "accountEnabled", default)]
    pub account_enabled: Option<String>,
}

impl DeviceSyncEntry {
    #[must_use]
    pub fn user_group(&self) -> DirectoryGroup {
        DirectoryGroup::new(&self.user_group_id, &self.user_group_name)
    }

    #[must_use]
    pub fn device_group(&self) -> DirectoryGroup {
        DirectoryGroup::new(&self.device_group_id, &self.device_group_name)
    }

    /// Label used in progress output and logs.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} -> {}", self.user_group_name, self.device_group_name)
    }
}

/// One copy-membership entry: copy the membership of 1..N source groups
/// into a destination group, additive-only.
#[derive(Debug, Clone, Deserialize)]
pub struct CopyEntry {
    /// Comma-separated source group object ids.
    #[serde(rename = "SourceAzureADGroupIds")]
    pub source_group_ids: String,
    /// Comma-separated source group display names, same order and count.
    #[serde(rename = "SourceAzureADGroupNames")]
    pub source_group_names: String,
    #[serde(rename = "DestinationAzureADGroupId")]
    pub destination_group_id: String,
    #[serde(rename = "DestinationAzureADGroupName")]
    pub destination_group_name: String,
}

impl CopyEntry {
    /// Splits the comma-separated id/name pair into source groups.
    ///
    /// # Errors
    ///
    /// `Validation` when the id and name lists disagree in count or either
    /// list is empty.
    pub fn source_groups(&self) -> EngineResult<Vec<DirectoryGroup>> {
        let ids = split_comma_list(&self.source_group_ids);
        let names = split_comma_list(&self.source_group_names);

        if ids.is_empty() {
            return Err(EngineError::Validation(
                "SourceAzureADGroupIds is empty".to_string(),
            ));
        }
        if ids.len() != names.len() {
            return Err(EngineError::Validation(format!(
                "SourceAzureADGroupIds has {} entries but SourceAzureADGroupNames has {}",
                ids.len(),
                names.len()
            )));
        }

        Ok(ids
            .into_iter()
            .zip(names)
            .map(|(id, name)| DirectoryGroup::new(id, name))
            .collect())
    }

    #[must_use]
    pub fn destination_group(&self) -> DirectoryGroup {
        DirectoryGroup::new(&self.destination_group_id, &self.destination_group_name)
    }

    /// Label used in progress output and logs.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "[{}] -> {}",
            self.source_group_names, self.destination_group_name
        )
    }
}

fn split_comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Fetches and parses a configuration document.
///
/// # Errors
///
/// `ConfigFetch` on any transport, status, or parse failure; a run cannot
/// proceed without configuration.
#[instrument(skip(http_client))]
pub async fn fetch_entries<T: DeserializeOwned>(
    http_client: &reqwest::Client,
    url: &str,
) -> EngineResult<Vec<T>> {
    let response = http_client
        .get(url)
        .send()
        .await
        .map_err(|e| EngineError::ConfigFetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(EngineError::ConfigFetch {
            url: url.to_string(),
            reason: format!("status {status}"),
        });
    }

    response.json().await.map_err(|e| EngineError::ConfigFetch {
        url: url.to_string(),
        reason: format!("invalid JSON: {e}"),
    })
}
