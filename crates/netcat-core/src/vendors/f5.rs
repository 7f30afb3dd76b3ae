//! F5 load balancer adapter.
//!
//! Grounded on `netcat_cli_f5.py`'s `OUTPUT_FORMATS_F5` catalog and
//! `F5CliAccess` (prompt regex encoding sync status and active/standby
//! role, `setup_cli` hardening commands). F5 exposes no deploy/snapshot
//! operations in the original driver, so `F5Adapter` implements only the
//! core `VendorAdapter` capability.

use std::any::Any;

use tracing::info;

use crate::error::NetcatError;
use crate::output_format::OutputFormat;
use crate::session::CliSession;

use super::VendorAdapter;

pub struct F5Adapter {
    username: String,
}

impl F5Adapter {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

impl VendorAdapter for F5Adapter {
    fn cli_prompt_pattern(&self, device_name: &str) -> String {
        format!(
            r"{}@\({}\)\(cfg-sync [\w,\s]+\)\((Active|Standby)\)\(/Common\)\(tmos\)# ",
            regex::escape(&self.username),
            device_name.to_uppercase()
        )
    }

    fn password_prompt_pattern(&self) -> String {
        "Password: ".to_string()
    }

    fn output_formats(&self) -> Vec<OutputFormat> {
        vec![
            OutputFormat {
                format_name: "backup".to_string(),
                pre_commands: vec![],
                commands: vec!["list".to_string()],
                post_commands: vec![],
                output_start: 2,
                output_end: -1,
            },
            OutputFormat {
                format_name: "info".to_string(),
                pre_commands: vec![],
                commands: vec![
                    "show sys clock".to_string(),
                    "show sys version".to_string(),
                    "show sys hardware".to_string(),
                ],
                post_commands: vec![],
                output_start: 4,
                output_end: -2,
            },
        ]
    }

    fn harden(&self, session: &mut CliSession, device_name: &str) -> Result<(), NetcatError> {
        info!(target: "vendors::f5", "configuring initial cli setup for {}", device_name);
        let prompt = self.cli_prompt_pattern(device_name);
        session.send("modify cli preference pager disabled", &prompt)?;
        session.send("modify cli preference display-threshold 0", &prompt)?;
        session.send("modify cli preference list-all-properties enabled", &prompt)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn prompt_matches_active_and_standby_roles() {
        let adapter = F5Adapter::new("admin");
        let re = Regex::new(&adapter.cli_prompt_pattern("lb1")).unwrap();
        assert!(re.is_match("admin@(LB1)(cfg-sync Changes Pending)(Active)(/Common)(tmos)# "));
        assert!(re.is_match("admin@(LB1)(cfg-sync In Sync)(Standby)(/Common)(tmos)# "));
    }
}
