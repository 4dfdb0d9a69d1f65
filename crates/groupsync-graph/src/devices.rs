//! Owned-device listings for users.

use serde::Deserialize;
use tracing::{instrument, warn};

use crate::{GraphClient, GraphError, GraphResult};

/// Device fields selected from the Graph API.
const DEVICE_SELECT_FIELDS: &str = "id,displayName,operatingSystem,deviceId,trustType,\
    profileType,managementType,enrollmentType,isCompliant,accountEnabled";

/// Page size for attribute-bearing device listings.
const DEVICE_PAGE_SIZE: usize = 100;

/// A registered device owned by a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// Directory object id. This is the id used for group membership.
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub operating_system: Option<String>,
    /// Hardware device id, distinct from the object id.
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub trust_type: Option<String>,
    #[serde(default)]
    pub profile_type: Option<String>,
    #[serde(default)]
    pub management_type: Option<String>,
    #[serde(default)]
    pub enrollment_type: Option<String>,
    #[serde(default)]
    pub is_compliant: Option<bool>,
    #[serde(default)]
    pub account_enabled: Option<bool>,
}

impl GraphClient {
    /// Lists all devices owned by a user, draining pagination.
    ///
    /// An unknown user yields an empty list, not an error.
    #[instrument(skip(self))]
    pub async fn list_user_owned_devices(&self, user_id: &str) -> GraphResult<Vec<DeviceRecord>> {
        let url = format!(
            "{}/users/{}/ownedDevices/microsoft.graph.device?$select={}&$top={}",
            self.base_url(),
            user_id,
            DEVICE_SELECT_FIELDS,
            DEVICE_PAGE_SIZE
        );

        let mut devices = Vec::new();
        let result = self
            .get_paginated(&url, |page: Vec<DeviceRecord>| {
                devices.extend(page);
                Ok(())
            })
            .await;

        match result {
            Ok(()) => Ok(devices),
            Err(GraphError::NotFound(url)) => {
                warn!("User {} not found ({}), treating as empty", user_id, url);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
