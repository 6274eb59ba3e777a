//! Target resolution: device names, group names and `all` to a device list.

use crate::inventory::{ALL_GROUP, Inventory};
use crate::types::{DeviceId, DeviceRecord};
use std::collections::HashSet;
use tracing::debug;

/// Ordered, deduplicated devices a run will query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    devices: Vec<DeviceRecord>,
}

impl TargetSet {
    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &DeviceId> {
        self.devices.iter().map(|d| &d.id)
    }

    /// More than one device means output lines get a source prefix.
    pub fn is_multi(&self) -> bool {
        self.devices.len() > 1
    }

    fn extend(
        &mut self,
        seen: &mut HashSet<DeviceId>,
        records: impl IntoIterator<Item = DeviceRecord>,
    ) {
        for record in records {
            if seen.insert(record.id.clone()) {
                self.devices.push(record);
            }
        }
    }
}

impl FromIterator<DeviceRecord> for TargetSet {
    fn from_iter<I: IntoIterator<Item = DeviceRecord>>(iter: I) -> Self {
        let mut set = TargetSet::default();
        let mut seen = HashSet::new();
        set.extend(&mut seen, iter);
        set
    }
}

/// Resolve tokens against an inventory. Never fails.
///
/// Tokens are matched as `all`, then device name, then group name. Anything
/// else becomes an unresolved single-device target and fails at dispatch.
pub fn resolve<I, S>(tokens: I, inventory: &impl Inventory) -> TargetSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = TargetSet::default();
    let mut seen = HashSet::new();

    for token in tokens {
        let token = token.as_ref();
        if token == ALL_GROUP {
            set.extend(&mut seen, inventory.all_devices());
        } else if let Some(device) = inventory.lookup_device(token) {
            set.extend(&mut seen, [device]);
        } else if let Some(members) = inventory.lookup_group(token) {
            debug!(group = token, members = members.len(), "expanded group");
            set.extend(&mut seen, members);
        } else {
            debug!(token, "token not in inventory, passing through");
            set.extend(&mut seen, [DeviceRecord::unresolved(token)]);
        }
    }

    set
}
