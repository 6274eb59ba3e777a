//! Device inventory: named devices and named groups of devices.
//!
//! The inventory file is TOML:
//!
//! ```text
//! [devices.pynet_rtr1]
//! host = "10.0.0.1"
//! platform = "cisco_ios"
//! user = "admin"
//!
//! [devices.pynet_rtr2]
//! host = "10.0.0.2"
//!
//! [groups]
//! cisco = ["pynet_rtr1", "pynet_rtr2"]
//! ```
//!
//! The group `all` is implicit and always contains every device.

use crate::types::{ConnectionParams, DeviceRecord};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reserved group name that expands to every device.
pub const ALL_GROUP: &str = "all";

/// Errors that can occur while loading an inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to read inventory {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse inventory {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("group '{group}' references undefined device '{device}'")]
    UnknownMember { group: String, device: String },

    #[error("'{0}' is reserved and cannot be declared as a group")]
    ReservedGroup(String),

    #[error("'{0}' is defined both as a device and as a group")]
    NameCollision(String),
}

/// Provider of device records, consulted by the resolver.
pub trait Inventory {
    fn lookup_device(&self, name: &str) -> Option<DeviceRecord>;

    /// Members of a named group, or `None` if no such group exists.
    fn lookup_group(&self, name: &str) -> Option<Vec<DeviceRecord>>;

    fn all_devices(&self) -> Vec<DeviceRecord>;

    fn device_names(&self) -> Vec<String>;

    /// Group names, including the implicit `all`.
    fn group_names(&self) -> Vec<String>;
}

#[derive(Debug, Default, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    devices: BTreeMap<String, ConnectionParams>,
    #[serde(default)]
    groups: BTreeMap<String, Vec<String>>,
}

/// In-memory inventory loaded from TOML or built programmatically.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    devices: BTreeMap<String, ConnectionParams>,
    groups: BTreeMap<String, Vec<String>>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate an inventory file.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let content = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|err| match err {
            InventoryError::Parse { source, .. } => InventoryError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, InventoryError> {
        let file: InventoryFile = toml::from_str(content).map_err(|source| InventoryError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        let mut inventory = Self::new();
        for (name, mut params) in file.devices {
            params.identity_file = params
                .identity_file
                .map(|p| crate::config::expand_home(&p).display().to_string());
            inventory.devices.insert(name, params);
        }
        for (group, members) in file.groups {
            inventory.insert_group(group, members)?;
        }
        Ok(inventory)
    }

    pub fn with_device(mut self, name: impl Into<String>, params: ConnectionParams) -> Self {
        self.devices.insert(name.into(), params);
        self
    }

    pub fn with_group<I, S>(
        mut self,
        name: impl Into<String>,
        members: I,
    ) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_group(name.into(), members.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    fn insert_group(&mut self, group: String, members: Vec<String>) -> Result<(), InventoryError> {
        if group == ALL_GROUP {
            return Err(InventoryError::ReservedGroup(group));
        }
        if self.devices.contains_key(&group) {
            return Err(InventoryError::NameCollision(group));
        }
        if let Some(missing) = members.iter().find(|m| !self.devices.contains_key(*m)) {
            return Err(InventoryError::UnknownMember {
                group,
                device: missing.clone(),
            });
        }
        self.groups.insert(group, members);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Apply a login user to every device.
    pub fn override_user(&mut self, user: &str) {
        for params in self.devices.values_mut() {
            params.user = Some(user.to_string());
        }
    }

    fn record(&self, name: &str) -> Option<DeviceRecord> {
        self.devices
            .get(name)
            .map(|params| DeviceRecord::new(name, params.clone()))
    }
}

impl Inventory for StaticInventory {
    fn lookup_device(&self, name: &str) -> Option<DeviceRecord> {
        self.record(name)
    }

    fn lookup_group(&self, name: &str) -> Option<Vec<DeviceRecord>> {
        if name == ALL_GROUP {
            return Some(self.all_devices());
        }
        self.groups
            .get(name)
            .map(|members| members.iter().filter_map(|m| self.record(m)).collect())
    }

    fn all_devices(&self) -> Vec<DeviceRecord> {
        self.devices
            .iter()
            .map(|(name, params)| DeviceRecord::new(name.as_str(), params.clone()))
            .collect()
    }

    fn device_names(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }

    fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.keys().cloned().collect();
        names.push(ALL_GROUP.to_string());
        names.sort();
        names
    }
}
