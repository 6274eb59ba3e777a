//! Rendering for `--list-devices`.

use devgrep_common::Inventory;
use std::fmt::Write as _;

const RULE: &str = "-------------------------";

fn section(out: &mut String, title: &str, names: &[String]) {
    let _ = writeln!(out, "{title}:");
    let _ = writeln!(out, "{RULE}");
    for name in names {
        let _ = writeln!(out, "{name}");
    }
}

/// `Devices:` then `Groups:`, each sorted, `all` always listed.
pub fn render_inventory(inventory: &impl Inventory) -> String {
    let mut devices = inventory.device_names();
    devices.sort();
    let mut groups = inventory.group_names();
    groups.sort();

    let mut out = String::new();
    out.push('\n');
    section(&mut out, "Devices", &devices);
    out.push('\n');
    section(&mut out, "Groups", &groups);
    out.push('\n');
    out
}
