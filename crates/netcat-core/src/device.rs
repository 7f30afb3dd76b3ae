//! Device identity and addressing types.
//!
//! Mirrors the teacher's `device_connection.rs` shape (`DeviceType`
//! FromStr/Display, a `Hash + Eq` descriptor usable as a map key) but
//! narrowed to the seven device types the fleet actually supports.

use std::fmt::{self, Display};
use std::str::FromStr;

/// Vendor/platform of a managed device, per the inventory's `deviceType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    PaloAlto,
    F5,
    CiscoNexus,
    CiscoRouter,
    CiscoSwitch,
    CiscoAsa,
    CiscoAsaMc,
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paloalto" => Ok(DeviceType::PaloAlto),
            "f5" => Ok(DeviceType::F5),
            "cisco_nexus" => Ok(DeviceType::CiscoNexus),
            "cisco_router" => Ok(DeviceType::CiscoRouter),
            "cisco_switch" => Ok(DeviceType::CiscoSwitch),
            "cisco_asa" => Ok(DeviceType::CiscoAsa),
            "cisco_asa_mc" => Ok(DeviceType::CiscoAsaMc),
            other => Err(format!("unsupported device type: {other}")),
        }
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceType::PaloAlto => "paloalto",
            DeviceType::F5 => "f5",
            DeviceType::CiscoNexus => "cisco_nexus",
            DeviceType::CiscoRouter => "cisco_router",
            DeviceType::CiscoSwitch => "cisco_switch",
            DeviceType::CiscoAsa => "cisco_asa",
            DeviceType::CiscoAsaMc => "cisco_asa_mc",
        };
        write!(f, "{s}")
    }
}

impl DeviceType {
    /// Whether this platform is any flavor of Cisco (Nexus/router/switch/ASA/ASA-MC).
    pub fn is_cisco(&self) -> bool {
        matches!(
            self,
            DeviceType::CiscoNexus
                | DeviceType::CiscoRouter
                | DeviceType::CiscoSwitch
                | DeviceType::CiscoAsa
                | DeviceType::CiscoAsaMc
        )
    }
}

/// How a CLI session authenticates to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Password,
    PublicKey,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "password" => Ok(AuthMode::Password),
            "publickey" | "public_key" | "rsa" => Ok(AuthMode::PublicKey),
            other => Err(format!("unsupported auth mode: {other}")),
        }
    }
}

/// Identifies a single managed device, as carried in the fleet inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceDescriptor {
    pub name: String,
    pub host: String,
    pub device_type: DeviceTypeKey,
    pub group: Option<String>,
}

/// `DeviceType` wrapped for use as a hash key (the enum itself already
/// derives `Hash`, this alias exists only to make call sites read clearly
/// where a descriptor's type specifically is meant).
pub type DeviceTypeKey = DeviceType;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_round_trips_through_display_and_fromstr() {
        let types = [
            DeviceType::PaloAlto,
            DeviceType::F5,
            DeviceType::CiscoNexus,
            DeviceType::CiscoRouter,
            DeviceType::CiscoSwitch,
            DeviceType::CiscoAsa,
            DeviceType::CiscoAsaMc,
        ];
        for t in types {
            let s = t.to_string();
            assert_eq!(DeviceType::from_str(&s).unwrap(), t);
        }
    }

    #[test]
    fn unknown_device_type_is_rejected() {
        assert!(DeviceType::from_str("juniper_junos").is_err());
    }

    #[test]
    fn only_cisco_platforms_report_is_cisco() {
        assert!(DeviceType::CiscoAsaMc.is_cisco());
        assert!(!DeviceType::PaloAlto.is_cisco());
        assert!(!DeviceType::F5.is_cisco());
    }

    #[test]
    fn auth_mode_accepts_rsa_alias_for_public_key() {
        assert_eq!(AuthMode::from_str("rsa").unwrap(), AuthMode::PublicKey);
    }
}
