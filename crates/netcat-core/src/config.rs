use std::time::Duration;

use crate::device::AuthMode;
use crate::settings::{get_timeout, TimeoutKind};

/// Per-connection configuration for a single device's CLI session.
#[derive(Debug, Clone)]
pub struct NetcatConfig {
    /// Hostname (also the DNS-resolvable device name).
    pub host: String,
    pub username: String,
    pub password: Option<String>,
    pub auth_mode: AuthMode,
    pub default_port: u16,
    pub login_timeout: Duration,
    pub command_timeout: Duration,
    pub read_buffer_size: usize,
    pub enable_session_log: bool,
    pub session_log_path: String,
}

impl Default for NetcatConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: None,
            auth_mode: AuthMode::Password,
            default_port: 22,
            login_timeout: get_timeout(TimeoutKind::Login),
            command_timeout: get_timeout(TimeoutKind::Command),
            read_buffer_size: 65536,
            enable_session_log: true,
            session_log_path: String::from("logs/session.log"),
        }
    }
}

impl NetcatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> NetcatConfigBuilder {
        NetcatConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct NetcatConfigBuilder {
    config: NetcatConfig,
}

impl NetcatConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    pub fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.config.auth_mode = mode;
        self
    }

    pub fn default_port(mut self, port: u16) -> Self {
        self.config.default_port = port;
        self
    }

    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.config.login_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    pub fn session_log_path(mut self, path: impl Into<String>) -> Self {
        self.config.session_log_path = path.into();
        self
    }

    pub fn build(self) -> NetcatConfig {
        self.config
    }
}
