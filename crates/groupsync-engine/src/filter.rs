//! Device-attribute filters applied to owned-device listings.

use std::fmt;
use std::str::FromStr;

use groupsync_graph::DeviceRecord;

use crate::{DeviceSyncEntry, EngineError, EngineResult};

/// Operating systems the configuration vocabulary admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingSystem {
    Windows,
    MacOS,
    IPhone,
    IPad,
    Android,
}

impl FromStr for OperatingSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::MacOS),
            "iphone" => Ok(Self::IPhone),
            "ipad" => Ok(Self::IPad),
            "android" => Ok(Self::Android),
            other => Err(format!("unknown operating system '{other}'")),
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "Windows",
            Self::MacOS => "MacOS",
            Self::IPhone => "IPhone",
            Self::IPad => "IPad",
            Self::Android => "Android",
        };
        f.write_str(name)
    }
}

/// Device trust (join) types the configuration vocabulary admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustType {
    AzureAd,
    ServerAd,
    Workplace,
}

impl FromStr for TrustType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azuread" => Ok(Self::AzureAd),
            "serverad" => Ok(Self::ServerAd),
            "workplace" => Ok(Self::Workplace),
            other => Err(format!("unknown trust type '{other}'")),
        }
    }
}

/// Tri-state constraint for boolean device attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    Yes,
    No,
    /// Unconstrained; both values pass.
    #[default]
    Any,
}

impl TriState {
    /// Parses the configuration value; absent or empty means unconstrained.
    ///
    /// # Errors
    ///
    /// Returns the offending value when it is not Yes, No, or Any.
    pub fn from_config(value: Option<&str>) -> Result<Self, String> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::Any),
            Some(v) if v.eq_ignore_ascii_case("yes") => Ok(Self::Yes),
            Some(v) if v.eq_ignore_ascii_case("no") => Ok(Self::No),
            Some(v) if v.eq_ignore_ascii_case("any") => Ok(Self::Any),
            Some(other) => Err(format!("invalid tri-state value '{other}'")),
        }
    }

    /// Whether a device attribute value satisfies this constraint. A
    /// missing attribute never satisfies a constrained state.
    #[must_use]
    pub fn admits(self, value: Option<bool>) -> bool {
        match self {
            Self::Any => true,
            Self::Yes => value == Some(true),
            Self::No => value == Some(false),
        }
    }
}

/// Attribute filter for owned devices, built once per entry from validated
/// configuration and passed immutably into the resolver.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    /// Empty means every operating system passes.
    pub operating_systems: Vec<OperatingSystem>,
    /// The membership test applies only when 1 or 2 trust types are
    /// configured; otherwise every trust type passes.
    pub trust_types: Vec<TrustType>,
    pub is_compliant: TriState,
    pub account_enabled: TriState,
}

impl DeviceFilter {
    /// Builds the filter from a configuration entry, validating every list
    /// against the fixed vocabularies. Any invalid value fails the whole
    /// entry; there is no partial processing.
    ///
    /// # Errors
    ///
    /// `Validation` naming the offending value.
    pub fn from_entry(entry: &DeviceSyncEntry) -> EngineResult<Self> {
        let operating_systems = entry
            .os_list
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|s| s.parse::<OperatingSystem>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(EngineError::Validation)?;

        let trust_types = entry
            .trust_type_list
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|s| s.parse::<TrustType>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(EngineError::Validation)?;

        let is_compliant =
            TriState::from_config(entry.is_compliant.as_deref()).map_err(EngineError::Validation)?;
        let account_enabled = TriState::from_config(entry.account_enabled.as_deref())
            .map_err(EngineError::Validation)?;

        Ok(Self {
            operating_systems,
            trust_types,
            is_compliant,
            account_enabled,
        })
    }

    /// Evaluates the filter against one device record.
    #[must_use]
    pub fn matches(&self, device: &DeviceRecord) -> bool {
        if !self.operating_systems.is_empty() {
            let os = device
                .operating_system
                .as_deref()
                .and_then(|s| s.parse::<OperatingSystem>().ok());
            match os {
                Some(os) if self.operating_systems.contains(&os) => {}
                _ => return false,
            }
        }

        if matches!(self.trust_types.len(), 1 | 2) {
            let trust = device
                .trust_type
                .as_deref()
                .and_then(|s| s.parse::<TrustType>().ok());
            match trust {
                Some(trust) if self.trust_types.contains(&trust) => {}
                _ => return false,
            }
        }

        self.account_enabled.admits(device.account_enabled)
            && self.is_compliant.admits(device.is_compliant)
    }
}
