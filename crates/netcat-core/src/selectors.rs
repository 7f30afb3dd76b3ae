//! Selectors: resolve an operator's device selection against the inventory.

use regex::Regex;
use tracing::warn;

use crate::device::DeviceType;

/// One entry of the static, job-scoped fleet inventory.
#[derive(Debug, Clone)]
pub struct InventoryEntry {
    pub device_name: String,
    pub device_type: DeviceType,
}

/// Exactly one operator selection mode, mirroring the `-a`/`-g`/`-d`/`-r`
/// CLI flags.
#[derive(Debug, Clone)]
pub enum Selector {
    All,
    Group(DeviceType),
    Devices(Vec<String>),
    Regex(String),
}

/// Resolve a selector against the inventory, returning device names in
/// inventory order. A malformed regex yields an empty selection and a
/// logged warning rather than a fatal error.
pub fn resolve(selector: &Selector, inventory: &[InventoryEntry]) -> Vec<String> {
    match selector {
        Selector::All => inventory.iter().map(|d| d.device_name.clone()).collect(),
        Selector::Group(device_type) => inventory
            .iter()
            .filter(|d| d.device_type == *device_type)
            .map(|d| d.device_name.clone())
            .collect(),
        Selector::Devices(names) => inventory
            .iter()
            .filter(|d| names.contains(&d.device_name))
            .map(|d| d.device_name.clone())
            .collect(),
        Selector::Regex(pattern) => match Regex::new(pattern) {
            Ok(re) => inventory
                .iter()
                .filter(|d| re.is_match(&d.device_name))
                .map(|d| d.device_name.clone())
                .collect(),
            Err(e) => {
                warn!(target: "selectors", "malformed selector regex {:?}: {}", pattern, e);
                Vec::new()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Vec<InventoryEntry> {
        vec![
            InventoryEntry {
                device_name: "rtr1".to_string(),
                device_type: DeviceType::CiscoRouter,
            },
            InventoryEntry {
                device_name: "rtr2".to_string(),
                device_type: DeviceType::CiscoRouter,
            },
            InventoryEntry {
                device_name: "fw1".to_string(),
                device_type: DeviceType::PaloAlto,
            },
        ]
    }

    #[test]
    fn all_selects_every_device_in_order() {
        let names = resolve(&Selector::All, &inventory());
        assert_eq!(names, vec!["rtr1", "rtr2", "fw1"]);
    }

    #[test]
    fn group_filters_by_device_type() {
        let names = resolve(&Selector::Group(DeviceType::CiscoRouter), &inventory());
        assert_eq!(names, vec!["rtr1", "rtr2"]);
    }

    #[test]
    fn devices_only_returns_known_names() {
        let names = resolve(
            &Selector::Devices(vec!["rtr1".to_string(), "ghost".to_string()]),
            &inventory(),
        );
        assert_eq!(names, vec!["rtr1"]);
    }

    #[test]
    fn devices_preserves_inventory_order_regardless_of_flag_order() {
        let names = resolve(
            &Selector::Devices(vec!["fw1".to_string(), "rtr1".to_string()]),
            &inventory(),
        );
        assert_eq!(names, vec!["rtr1", "fw1"]);
    }

    #[test]
    fn malformed_regex_yields_empty_selection() {
        let names = resolve(&Selector::Regex("(unclosed".to_string()), &inventory());
        assert!(names.is_empty());
    }

    #[test]
    fn regex_selects_matching_names() {
        let names = resolve(&Selector::Regex("^rtr".to_string()), &inventory());
        assert_eq!(names, vec!["rtr1", "rtr2"]);
    }
}
