//! Small shared helpers that don't belong to any one component.

use chrono::{Local, Utc};

/// A local-time tag of the form `YYYYMMDD_HHMM_<suffix>`, used to name
/// on-device configuration snapshots (`create_config_snapshot` in the
/// original driver).
pub fn timestamp_tag(suffix: &str) -> String {
    format!("{}_{}", Local::now().format("%Y%m%d_%H%M"), suffix)
}

/// UNIX seconds, UTC — the `snapshotTimestamp` a job driver assigns once
/// and holds fixed across every device's worker (spec.md §3).
pub fn unix_timestamp_now() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_tag_has_expected_shape() {
        let tag = timestamp_tag("netcat");
        assert!(tag.ends_with("_netcat"));
        assert_eq!(tag.len(), "YYYYMMDD_HHMM".len() + "_netcat".len());
    }

    #[test]
    fn unix_timestamp_now_is_a_plausible_recent_value() {
        let ts = unix_timestamp_now();
        assert!(ts > 1_700_000_000);
    }
}
