//! Global, process-wide operational settings.
//!
//! Mirrors the teacher's `settings.rs`: a single `RwLock<Settings>` populated
//! once at startup (environment variables, optionally layered with a TOML
//! file via the `config` crate) and read through small typed accessor
//! functions rather than threaded through every call site.

use std::sync::RwLock;
use std::time::Duration;

use lazy_static::lazy_static;

/// Named timeout categories used throughout the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutKind {
    Login,
    Command,
    Commit,
    SoftwareCheck,
    RebootBanner,
    HaStabilization,
    CommitInProgressClear,
}

#[derive(Debug, Clone)]
pub struct TimeoutSettings {
    pub login: Duration,
    pub command: Duration,
    pub commit: Duration,
    pub software_check: Duration,
    pub reboot_banner: Duration,
    /// (interval, attempts) — HA stabilization polls every `interval` up to
    /// `attempts` times (30 x 60s = 30 minutes total).
    pub ha_stabilization: (Duration, u32),
    /// (interval, attempts) — commit-in-progress clear polls every `interval`
    /// up to `attempts` times (6 x 30s = 3 minutes total).
    pub commit_in_progress_clear: (Duration, u32),
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            login: Duration::from_secs(60),
            command: Duration::from_secs(90),
            commit: Duration::from_secs(300),
            software_check: Duration::from_secs(120),
            reboot_banner: Duration::from_secs(180),
            ha_stabilization: (Duration::from_secs(60), 30),
            commit_in_progress_clear: (Duration::from_secs(30), 6),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConcurrencySettings {
    /// Maximum number of devices processed concurrently by the Fleet Runner.
    pub max_workers: usize,
    /// When true, the Fleet Runner executes devices sequentially on the
    /// driver's own thread instead of fanning out.
    pub single_process_mode: bool,
}

impl Default for ConcurrencySettings {
    fn default() -> Self {
        Self {
            max_workers: 120,
            single_process_mode: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageRetrySettings {
    pub max_attempts: u32,
    pub backoff_range_secs: (f64, f64),
}

impl Default for StorageRetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            backoff_range_secs: (0.1, 10.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub timeouts: TimeoutSettings,
    pub concurrency: ConcurrencySettings,
    pub storage_retry: StorageRetrySettings,
    pub debug: bool,
}

lazy_static! {
    static ref SETTINGS: RwLock<Settings> = RwLock::new(load_settings());
}

fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = std::env::var("NETCAT_MAX_WORKERS") {
        if let Ok(n) = raw.parse() {
            settings.concurrency.max_workers = n;
        }
    }

    if std::env::var("NETCAT_SINGLE_PROCESS").is_ok() {
        settings.concurrency.single_process_mode = true;
    }

    if std::env::var("NETCAT_DEBUG").is_ok() {
        settings.debug = true;
    }

    settings
}

/// Reload settings from the environment and an optional config file, layered
/// the way the teacher's workspace already depends on the `config` crate for.
pub fn reload_from_file(path: &str) -> Result<(), config::ConfigError> {
    let cfg = config::Config::builder()
        .add_source(config::Environment::with_prefix("NETCAT"))
        .add_source(config::File::with_name(path).required(false))
        .build()?;

    let mut settings = SETTINGS.write().expect("settings lock poisoned");

    if let Ok(max_workers) = cfg.get::<usize>("max_workers") {
        settings.concurrency.max_workers = max_workers;
    }
    if let Ok(single_process) = cfg.get::<bool>("single_process_mode") {
        settings.concurrency.single_process_mode = single_process;
    }
    if let Ok(debug) = cfg.get::<bool>("debug") {
        settings.debug = debug;
    }

    Ok(())
}

pub fn get_timeout(kind: TimeoutKind) -> Duration {
    let settings = SETTINGS.read().expect("settings lock poisoned");
    match kind {
        TimeoutKind::Login => settings.timeouts.login,
        TimeoutKind::Command => settings.timeouts.command,
        TimeoutKind::Commit => settings.timeouts.commit,
        TimeoutKind::SoftwareCheck => settings.timeouts.software_check,
        TimeoutKind::RebootBanner => settings.timeouts.reboot_banner,
        TimeoutKind::HaStabilization => settings.timeouts.ha_stabilization.0,
        TimeoutKind::CommitInProgressClear => settings.timeouts.commit_in_progress_clear.0,
    }
}

pub fn get_retry_attempts(kind: TimeoutKind) -> u32 {
    let settings = SETTINGS.read().expect("settings lock poisoned");
    match kind {
        TimeoutKind::HaStabilization => settings.timeouts.ha_stabilization.1,
        TimeoutKind::CommitInProgressClear => settings.timeouts.commit_in_progress_clear.1,
        _ => 1,
    }
}

pub fn max_workers() -> usize {
    SETTINGS.read().expect("settings lock poisoned").concurrency.max_workers
}

pub fn single_process_mode() -> bool {
    SETTINGS
        .read()
        .expect("settings lock poisoned")
        .concurrency
        .single_process_mode
}

pub fn set_single_process_mode(enabled: bool) {
    SETTINGS.write().expect("settings lock poisoned").concurrency.single_process_mode = enabled;
}

pub fn set_max_workers(n: usize) {
    SETTINGS.write().expect("settings lock poisoned").concurrency.max_workers = n;
}

pub fn storage_retry() -> StorageRetrySettings {
    SETTINGS.read().expect("settings lock poisoned").storage_retry.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let settings = Settings::default();
        assert_eq!(settings.timeouts.login, Duration::from_secs(60));
        assert_eq!(settings.timeouts.command, Duration::from_secs(90));
        assert_eq!(settings.timeouts.commit, Duration::from_secs(300));
        assert_eq!(settings.timeouts.software_check, Duration::from_secs(120));
        assert_eq!(settings.timeouts.ha_stabilization, (Duration::from_secs(60), 30));
        assert_eq!(settings.timeouts.commit_in_progress_clear, (Duration::from_secs(30), 6));
        assert_eq!(settings.concurrency.max_workers, 120);
        assert_eq!(settings.storage_retry.max_attempts, 15);
        assert_eq!(settings.storage_retry.backoff_range_secs, (0.1, 10.0));
    }

    #[test]
    fn single_process_mode_can_be_toggled() {
        set_single_process_mode(true);
        assert!(single_process_mode());
        set_single_process_mode(false);
        assert!(!single_process_mode());
    }
}
