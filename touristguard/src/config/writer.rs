//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let min_retry_interval = config
        .delivery
        .min_retry_interval
        .map(|v| v.to_string())
        .unwrap_or_default();

    format!(
        r#"[api]
; Root URL of the tourist-safety API
base_url = {}
; Timeout in seconds for each HTTP request (default: 10)
timeout = {}
; Look the digital ID up before activating (default: true)
validate_identity = {}

[tracking]
; Positioning accuracy (default: balanced)
;   lowest, low, balanced, high, highest, best_for_navigation
accuracy = {}
; Seconds between location samples (default: 600)
sample_interval = {}
; Maximum seconds samples may be held before delivery (default: 600)
deferred_interval = {}
; Classify each sample against geofences on this device (default: true)
local_classification = {}

[delivery]
; Minimum seconds between retries of one report
; If empty, follows tracking.sample_interval
min_retry_interval = {}
; Maximum retry backoff in seconds (default: 3600)
max_backoff = {}
; Pending reports kept while offline; older ones are dropped (default: 32)
retention_ceiling = {}
; Seconds allowed to deliver the backlog when tracking stops (default: 10)
drain_timeout = {}

[geofence]
; Seconds between zone refreshes (default: 300)
refresh_interval = {}

[storage]
; File holding the activated digital ID
identity_file = {}

[logging]
; Log directory and file name (the file is cleared on each start)
directory = {}
file = {}
"#,
        config.api.base_url,
        config.api.timeout,
        config.api.validate_identity,
        config.tracking.accuracy,
        config.tracking.sample_interval,
        config.tracking.deferred_interval,
        config.tracking.local_classification,
        min_retry_interval,
        config.delivery.max_backoff,
        config.delivery.retention_ceiling,
        config.delivery.drain_timeout,
        config.geofence.refresh_interval,
        path_to_string(&config.storage.identity_file),
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Render a path, collapsing the home directory back to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse_ini;
    use super::*;
    use ini::Ini;

    #[test]
    fn test_written_config_parses_back() {
        let mut config = ConfigFile::default();
        config.api.base_url = "https://safety.example.org/api".to_string();
        config.tracking.sample_interval = 120;
        config.delivery.min_retry_interval = Some(45);
        config.delivery.retention_ceiling = 4;

        let content = to_config_string(&config);
        let parsed = parse_ini(&Ini::load_from_str(&content).unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_empty_min_retry_follows_sampling() {
        let content = to_config_string(&ConfigFile::default());
        assert!(content.contains("min_retry_interval = \n"));

        let parsed = parse_ini(&Ini::load_from_str(&content).unwrap()).unwrap();
        assert_eq!(parsed.delivery.min_retry_interval, None);
    }
}
