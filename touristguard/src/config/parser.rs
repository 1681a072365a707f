//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::location::AccuracyTier;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [api] section
    if let Some(section) = ini.section(Some("api")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !v.is_empty() {
                if !v.starts_with("http://") && !v.starts_with("https://") {
                    return Err(invalid("api", "base_url", v, "must start with http:// or https://"));
                }
                config.api.base_url = v.to_string();
            }
        }
        if let Some(v) = positive_secs(section, "api", "timeout")? {
            config.api.timeout = v;
        }
        if let Some(v) = section.get("validate_identity") {
            config.api.validate_identity = parse_bool(v);
        }
    }

    // [tracking] section
    if let Some(section) = ini.section(Some("tracking")) {
        if let Some(v) = section.get("accuracy") {
            config.tracking.accuracy = AccuracyTier::from_str(v).map_err(|_| {
                invalid(
                    "tracking",
                    "accuracy",
                    v,
                    "must be one of: lowest, low, balanced, high, highest, best_for_navigation",
                )
            })?;
        }
        if let Some(v) = positive_secs(section, "tracking", "sample_interval")? {
            config.tracking.sample_interval = v;
        }
        if let Some(v) = positive_secs(section, "tracking", "deferred_interval")? {
            config.tracking.deferred_interval = v;
        }
        if let Some(v) = section.get("local_classification") {
            config.tracking.local_classification = parse_bool(v);
        }
    }

    // [delivery] section
    if let Some(section) = ini.section(Some("delivery")) {
        if let Some(v) = positive_secs(section, "delivery", "min_retry_interval")? {
            config.delivery.min_retry_interval = Some(v);
        }
        if let Some(v) = positive_secs(section, "delivery", "max_backoff")? {
            config.delivery.max_backoff = v;
        }
        if let Some(v) = section.get("retention_ceiling") {
            config.delivery.retention_ceiling = match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(invalid(
                        "delivery",
                        "retention_ceiling",
                        v,
                        "must be a positive integer (reports)",
                    ))
                }
            };
        }
        if let Some(v) = section.get("drain_timeout") {
            config.delivery.drain_timeout = v
                .trim()
                .parse()
                .map_err(|_| invalid("delivery", "drain_timeout", v, "must be an integer (seconds)"))?;
        }
    }

    // [geofence] section
    if let Some(section) = ini.section(Some("geofence")) {
        if let Some(v) = positive_secs(section, "geofence", "refresh_interval")? {
            config.geofence.refresh_interval = v;
        }
    }

    // [storage] section
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = section.get("identity_file") {
            let v = v.trim();
            if !v.is_empty() {
                config.storage.identity_file = expand_tilde(v);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

/// Read an optional strictly positive integer number of seconds.
///
/// A missing or empty value leaves the default in place.
fn positive_secs(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<u64>, ConfigFileError> {
    let Some(v) = section.get(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    match v.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(invalid(
            section_name,
            key,
            v,
            "must be a positive integer (seconds)",
        )),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a boolean value from a string.
///
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive).
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_overlay_values() {
        let config = parse(
            r#"
[api]
base_url = https://safety.example.org/api
timeout = 5
validate_identity = no

[tracking]
accuracy = high
sample_interval = 60
deferred_interval = 300
local_classification = false

[delivery]
min_retry_interval = 30
max_backoff = 900
retention_ceiling = 8
drain_timeout = 0

[geofence]
refresh_interval = 120

[storage]
identity_file = /var/lib/touristguard/identity

[logging]
directory = /tmp/tg-logs
file = tg.log
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://safety.example.org/api");
        assert_eq!(config.api.timeout, 5);
        assert!(!config.api.validate_identity);
        assert_eq!(config.tracking.accuracy, AccuracyTier::High);
        assert_eq!(config.tracking.sample_interval, 60);
        assert_eq!(config.tracking.deferred_interval, 300);
        assert!(!config.tracking.local_classification);
        assert_eq!(config.delivery.min_retry_interval, Some(30));
        assert_eq!(config.delivery.max_backoff, 900);
        assert_eq!(config.delivery.retention_ceiling, 8);
        assert_eq!(config.delivery.drain_timeout, 0);
        assert_eq!(config.geofence.refresh_interval, 120);
        assert_eq!(
            config.storage.identity_file,
            PathBuf::from("/var/lib/touristguard/identity")
        );
        assert_eq!(config.logging.directory, PathBuf::from("/tmp/tg-logs"));
        assert_eq!(config.logging.file, "tg.log");
    }

    #[test]
    fn test_invalid_accuracy() {
        let err = parse("[tracking]\naccuracy = sharp\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref section, ref key, .. }
                if section == "tracking" && key == "accuracy"
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(parse("[tracking]\nsample_interval = 0\n").is_err());
        assert!(parse("[geofence]\nrefresh_interval = -1\n").is_err());
        assert!(parse("[delivery]\nretention_ceiling = 0\n").is_err());
    }

    #[test]
    fn test_base_url_scheme_checked() {
        assert!(parse("[api]\nbase_url = localhost:4000\n").is_err());
    }

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("true"));
        assert!(parse_bool("YES"));
        assert!(parse_bool("1"));
        assert!(parse_bool(" on "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("no"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x/identity"), home.join("x/identity"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
