//! Sync settings shared by the CLI and app clients.
//!
//! Settings are an explicit value handed to whoever needs them (the reconcile
//! pass, review formatting), persisted as a small JSON document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::conflict::DisplayOptions;
use crate::error::{Error, Result};
use crate::models::ResolutionStrategy;
use crate::sync::{AutoResolution, ReconcilePolicy};

const SETTINGS_SCHEMA_VERSION: u32 = 1;
const DEFAULT_RETENTION_DAYS: u32 = 90;
const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Persistent offline-sync settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSettings {
    #[serde(default = "default_settings_version")]
    pub version: u32,
    /// Strategy applied when conflicts are resolved without an explicit choice
    #[serde(default)]
    pub default_strategy: ResolutionStrategy,
    /// Resolve conflicts as soon as they are detected
    #[serde(default)]
    pub auto_resolve: bool,
    /// Merge both sides instead of picking one when auto-resolving
    #[serde(default)]
    pub prefer_merge: bool,
    /// Resolved conflicts older than this many days may be cleared
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default)]
    pub display: DisplayOptions,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_SCHEMA_VERSION,
            default_strategy: ResolutionStrategy::default(),
            auto_resolve: false,
            prefer_merge: false,
            retention_days: DEFAULT_RETENTION_DAYS,
            display: DisplayOptions::default(),
        }
    }
}

const fn default_settings_version() -> u32 {
    SETTINGS_SCHEMA_VERSION
}

const fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

impl SyncSettings {
    /// Load settings, falling back to defaults when the file does not exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            Error::Config(format!("Failed to read settings at {}: {error}", path.display()))
        })?;
        Self::parse(&raw).map_err(|error| {
            Error::Config(format!("Failed to parse settings at {}: {error}", path.display()))
        })
    }

    /// Parse settings from a raw JSON payload.
    pub fn parse(payload: &str) -> std::result::Result<Self, String> {
        let mut settings =
            serde_json::from_str::<Self>(payload).map_err(|error| error.to_string())?;
        if settings.version > SETTINGS_SCHEMA_VERSION {
            return Err(format!(
                "unsupported settings version {} (expected {SETTINGS_SCHEMA_VERSION})",
                settings.version
            ));
        }
        settings.normalize();
        Ok(settings)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!(
                    "Failed to create settings directory {}: {error}",
                    parent.display()
                ))
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized).map_err(|error| {
            Error::Config(format!("Failed to write settings at {}: {error}", path.display()))
        })
    }

    /// Policy for the reconcile pass derived from these settings.
    pub const fn reconcile_policy(&self) -> ReconcilePolicy {
        let auto_resolve = if !self.auto_resolve {
            None
        } else if self.prefer_merge {
            Some(AutoResolution::Merge)
        } else {
            Some(AutoResolution::Strategy(self.default_strategy))
        };
        ReconcilePolicy { auto_resolve }
    }

    /// Resolution instant before which resolved conflicts may be cleared.
    pub fn retention_cutoff(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(i64::from(self.retention_days).saturating_mul(MS_PER_DAY))
    }

    fn normalize(&mut self) {
        self.version = SETTINGS_SCHEMA_VERSION;
        if self.display.date_format.trim().is_empty() {
            self.display.date_format = DisplayOptions::default().date_format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let tmp = tempdir().unwrap();
        let settings = SyncSettings::load_from_path(&tmp.path().join("missing.json")).unwrap();
        assert_eq!(settings, SyncSettings::default());
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("sync-config.json");

        let settings = SyncSettings {
            default_strategy: ResolutionStrategy::Server,
            auto_resolve: true,
            retention_days: 7,
            ..SyncSettings::default()
        };
        settings.save_to_path(&path).unwrap();

        assert_eq!(SyncSettings::load_from_path(&path).unwrap(), settings);
    }

    #[test]
    fn parse_fills_defaults_and_display_overrides() {
        let settings = SyncSettings::parse(
            r#"{"default_strategy": "oldest", "display": {"empty_marker": "-"}}"#,
        )
        .unwrap();

        assert_eq!(settings.default_strategy, ResolutionStrategy::Oldest);
        assert_eq!(settings.retention_days, 90);
        assert_eq!(settings.display.empty_marker, "-");
        assert_eq!(settings.display.yes_label, "Sim");
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        let error = SyncSettings::parse(r#"{"strategy": "newest"}"#).unwrap_err();
        assert!(error.contains("unknown field"));
    }

    #[test]
    fn parse_rejects_future_version() {
        let error = SyncSettings::parse(r#"{"version": 9}"#).unwrap_err();
        assert!(error.contains("version"));
    }

    #[test]
    fn invalid_file_reports_config_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("sync-config.json");
        std::fs::write(&path, "not json").unwrap();

        let error = SyncSettings::load_from_path(&path).unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn reconcile_policy_follows_flags() {
        let mut settings = SyncSettings::default();
        assert_eq!(settings.reconcile_policy().auto_resolve, None);

        settings.auto_resolve = true;
        settings.default_strategy = ResolutionStrategy::Local;
        assert_eq!(
            settings.reconcile_policy().auto_resolve,
            Some(AutoResolution::Strategy(ResolutionStrategy::Local))
        );

        settings.prefer_merge = true;
        assert_eq!(
            settings.reconcile_policy().auto_resolve,
            Some(AutoResolution::Merge)
        );
    }

    #[test]
    fn retention_cutoff_subtracts_days() {
        let settings = SyncSettings {
            retention_days: 2,
            ..SyncSettings::default()
        };
        assert_eq!(settings.retention_cutoff(3 * MS_PER_DAY), MS_PER_DAY);
    }
}
