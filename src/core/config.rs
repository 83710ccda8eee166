use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::core::models::permission::{AccessType, Permission, PermissionRequirement, RecordType};
use crate::core::poller::PollerOptions;
use crate::core::providers::ProviderKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_format() -> String {
    "text".to_string()
}
fn default_color() -> String {
    "auto".to_string()
}
fn default_poll_interval() -> u64 {
    60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            color: default_color(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Export file read by the `file` provider
    pub path: Option<String>,
    /// Base URL of the `http` bridge
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_settings_link")]
    pub settings_link: String,
    #[serde(default = "default_fallback_link")]
    pub fallback_link: Option<String>,
}

fn default_kind() -> String {
    "file".to_string()
}
fn default_settings_link() -> String {
    "package:com.google.android.apps.healthdata".to_string()
}
fn default_fallback_link() -> Option<String> {
    Some("market://details?id=com.google.android.apps.healthdata".to_string())
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            path: None,
            endpoint: None,
            api_key: None,
            settings_link: default_settings_link(),
            fallback_link: default_fallback_link(),
        }
    }
}

impl ProviderSettings {
    /// Export file path, expanding a leading `~/`. Defaults to the data dir.
    pub fn export_path(&self) -> PathBuf {
        match self.path.as_deref() {
            Some(p) => expand_home(p),
            None => data_dir().join("export.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionConfig {
    pub record_type: String,
    #[serde(default = "default_access")]
    pub access_type: String,
}

fn default_access() -> String {
    "read".to_string()
}

fn default_permissions() -> Vec<PermissionConfig> {
    PermissionRequirement::default()
        .permissions()
        .iter()
        .map(|p| PermissionConfig {
            record_type: p.record_type.id().to_string(),
            access_type: p.access_type.id().to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default = "default_permissions")]
    pub permissions: Vec<PermissionConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            provider: ProviderSettings::default(),
            permissions: default_permissions(),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join(rest),
        None => PathBuf::from(path),
    }
}

/// Data directory, respecting XDG_DATA_HOME
pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join(".local")
                .join("share")
        })
        .join("nutrisync")
}

impl AppConfig {
    /// Get the config file path, respecting XDG_CONFIG_HOME
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("nutrisync").join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Serialize and write this config to the config file path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Required permissions, skipping entries that fail validation.
    pub fn requirement(&self) -> PermissionRequirement {
        let permissions: Vec<Permission> = self
            .permissions
            .iter()
            .filter_map(|p| {
                Some(Permission {
                    record_type: RecordType::from_id(&p.record_type)?,
                    access_type: AccessType::from_id(&p.access_type)?,
                })
            })
            .collect();
        if permissions.is_empty() {
            PermissionRequirement::default()
        } else {
            PermissionRequirement::new(permissions)
        }
    }

    pub fn poller_options(&self) -> PollerOptions {
        PollerOptions {
            interval: Duration::from_secs(self.settings.poll_interval_secs.max(1)),
            settings_link: self.provider.settings_link.clone(),
            fallback_link: self.provider.fallback_link.clone(),
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !["text", "json"].contains(&self.settings.default_format.as_str()) {
            issues.push(format!(
                "Invalid default_format: '{}' (must be 'text' or 'json')",
                self.settings.default_format
            ));
        }
        if !["auto", "always", "never"].contains(&self.settings.color.as_str()) {
            issues.push(format!(
                "Invalid color: '{}' (must be 'auto', 'always', or 'never')",
                self.settings.color
            ));
        }
        if self.settings.poll_interval_secs == 0 {
            issues.push("poll_interval_secs must be at least 1".to_string());
        }
        match ProviderKind::from_id(&self.provider.kind) {
            None => {
                let kinds: Vec<&str> = ProviderKind::all().iter().map(|k| k.id()).collect();
                issues.push(format!(
                    "Unknown provider kind: '{}' (must be {})",
                    self.provider.kind,
                    kinds.join("|")
                ))
            }
            Some(ProviderKind::Http) => match self.provider.endpoint.as_deref() {
                None => issues.push("provider.endpoint is required for kind 'http'".to_string()),
                Some(url) if !url.starts_with("https://") => {
                    issues.push(format!("provider.endpoint must use HTTPS, got: {}", url))
                }
                Some(_) => {}
            },
            Some(ProviderKind::File) => {}
        }
        for p in &self.permissions {
            if RecordType::from_id(&p.record_type).is_none() {
                issues.push(format!("Unknown record type: '{}'", p.record_type));
            }
            if AccessType::from_id(&p.access_type).is_none() {
                issues.push(format!(
                    "Permission '{}': invalid access_type '{}' (must be read|write)",
                    p.record_type, p.access_type
                ));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let config = AppConfig::default();
        let issues = config.validate();
        assert!(issues.is_empty(), "Default config should be valid, got: {:?}", issues);
    }

    #[test]
    fn default_poll_interval_is_one_minute() {
        let config = AppConfig::default();
        assert_eq!(config.poller_options().interval, Duration::from_secs(60));
    }

    #[test]
    fn default_requirement_matches_nutrition_and_hydration() {
        let config = AppConfig::default();
        assert_eq!(config.requirement(), PermissionRequirement::default());
    }

    #[test]
    fn validate_catches_invalid_format_and_color() {
        let mut config = AppConfig::default();
        config.settings.default_format = "xml".to_string();
        config.settings.color = "blue".to_string();
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.contains("default_format")));
        assert!(issues.iter().any(|i| i.contains("color")));
    }

    #[test]
    fn validate_catches_zero_interval() {
        let mut config = AppConfig::default();
        config.settings.poll_interval_secs = 0;
        assert!(config.validate().iter().any(|i| i.contains("poll_interval_secs")));
    }

    #[test]
    fn validate_http_provider_needs_https_endpoint() {
        let mut config = AppConfig::default();
        config.provider.kind = "http".to_string();
        assert!(config.validate().iter().any(|i| i.contains("required")));
        config.provider.endpoint = Some("http://bridge.local".to_string());
        assert!(config.validate().iter().any(|i| i.contains("HTTPS")));
        config.provider.endpoint = Some("https://bridge.local".to_string());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn validate_catches_unknown_record_type_and_access() {
        let mut config = AppConfig::default();
        config.permissions.push(PermissionConfig {
            record_type: "Steps".to_string(),
            access_type: "peek".to_string(),
        });
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.contains("Unknown record type")));
        assert!(issues.iter().any(|i| i.contains("access_type")));
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[settings]
default_format = "json"
poll_interval_secs = 30
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.settings.default_format, "json");
        assert_eq!(config.settings.color, "auto");
        assert_eq!(config.poller_options().interval, Duration::from_secs(30));
        assert_eq!(config.provider.kind, "file");
        assert_eq!(config.permissions.len(), 2);
    }

    #[test]
    fn parse_provider_and_permissions_toml() {
        let toml = r#"
[provider]
kind = "http"
endpoint = "https://bridge.local/api"
api_key = "secret"

[[permissions]]
record_type = "Nutrition"

[[permissions]]
record_type = "Weight"
access_type = "read"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.provider.endpoint.as_deref(), Some("https://bridge.local/api"));
        let req = config.requirement();
        assert_eq!(
            req.permissions(),
            &[
                Permission::read(RecordType::Nutrition),
                Permission::read(RecordType::Weight)
            ]
        );
    }

    #[test]
    fn parse_empty_toml_gives_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.settings.default_format, "text");
        assert_eq!(config.settings.poll_interval_secs, 60);
        assert!(config.provider.settings_link.starts_with("package:"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.settings.poll_interval_secs = 15;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.settings.poll_interval_secs, 15);
        assert_eq!(loaded.permissions.len(), 2);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let config = AppConfig::load_from(std::path::Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.settings.default_format, "text");
    }

    #[test]
    fn export_path_expands_home() {
        let settings = ProviderSettings {
            path: Some("~/health/export.json".to_string()),
            ..ProviderSettings::default()
        };
        let path = settings.export_path();
        assert!(path.ends_with("health/export.json"));
        assert!(!path.starts_with("~"));
    }

    #[test]
    fn config_path_uses_xdg_when_set() {
        std::env::set_var("XDG_CONFIG_HOME", "/tmp/test_xdg_config");
        let path = AppConfig::config_path();
        std::env::remove_var("XDG_CONFIG_HOME");
        assert_eq!(path, PathBuf::from("/tmp/test_xdg_config/nutrisync/config.toml"));
    }
}
