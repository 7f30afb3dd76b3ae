//! Adapter factory: build the right `VendorAdapter` for a device's type and
//! dispatch the capability traits (`DeploySnippet`, `CreateSnapshot`,
//! `SiteIdentityOps`, `PaloAltoOps`) without repeating `as_any()`
//! downcasting at every call site.
//!
//! This enum is the driver-layer counterpart to the engine's "adapter
//! variants tagged by device kind" pattern (see `vendors::cisco`):
//! `netcat-core` keeps capability queries generic via `Any`, while the
//! driver glue — which always knows which concrete adapter it built —
//! matches directly.

use netcat_core::{
    CiscoAdapter, CliSession, CreateSnapshot, DeploySnippet, DeviceType, F5Adapter, NetcatError,
    PaloAltoAdapter, PaloAltoOps, SiteIdentityOps, VendorAdapter,
};

pub enum Adapter {
    Cisco(CiscoAdapter),
    F5(F5Adapter),
    PaloAlto(PaloAltoAdapter),
}

impl Adapter {
    pub fn new(device_type: DeviceType, username: &str) -> Self {
        match device_type {
            DeviceType::F5 => Adapter::F5(F5Adapter::new(username)),
            DeviceType::PaloAlto => Adapter::PaloAlto(PaloAltoAdapter::new(username)),
            other => Adapter::Cisco(CiscoAdapter::new(other)),
        }
    }

    pub fn as_vendor(&self) -> &dyn VendorAdapter {
        match self {
            Adapter::Cisco(a) => a,
            Adapter::F5(a) => a,
            Adapter::PaloAlto(a) => a,
        }
    }

    pub fn deploy_snippet(
        &self,
        session: &mut CliSession,
        device_name: &str,
        snippet: &str,
        no_commit: bool,
    ) -> Result<(), NetcatError> {
        match self {
            Adapter::Cisco(a) => a.deploy_snippet(session, device_name, snippet, no_commit),
            Adapter::PaloAlto(a) => a.deploy_snippet(session, device_name, snippet, no_commit),
            Adapter::F5(_) => Err(NetcatError::ConfigurationFault(
                "F5 devices do not support snippet deployment".into(),
            )),
        }
    }

    pub fn create_snapshot(&self, session: &mut CliSession, device_name: &str) -> Result<(), NetcatError> {
        match self {
            Adapter::Cisco(a) => a.create_snapshot(session, device_name),
            Adapter::PaloAlto(a) => a.create_snapshot(session, device_name),
            Adapter::F5(_) => Err(NetcatError::ConfigurationFault(
                "F5 devices do not support device-local snapshotting".into(),
            )),
        }
    }

    /// `None` for device kinds with no site-identity operations
    /// (everything but Cisco routers and Palo Alto).
    pub fn site_identity(&self) -> Option<&dyn SiteIdentityOps> {
        match self {
            Adapter::Cisco(a) if a.kind() == DeviceType::CiscoRouter => Some(a),
            Adapter::PaloAlto(a) => Some(a),
            _ => None,
        }
    }

    pub fn palo_alto_ops(&self) -> Option<&dyn PaloAltoOps> {
        match self {
            Adapter::PaloAlto(a) => Some(a),
            _ => None,
        }
    }
}
