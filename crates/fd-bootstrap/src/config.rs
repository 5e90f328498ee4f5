//! # Configuration Loader
//!
//! Reads the TOML file and maps it to the [`AppConfig`] DTO. No validation
//! and no defaults: missing values stay empty and the wiring layer decides
//! what an empty value means.

use std::path::{Path, PathBuf};

use anyhow::Context;
use fd_core::config::AppConfig;
use tracing::{info, warn};

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "fiscaldesk";

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
}

/// `<config dir>/fiscaldesk/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Pick the configuration to run with.
///
/// An explicit path must load. Without one, the default location is tried and
/// a missing file falls back to [`AppConfig::with_system_defaults`] under the
/// platform data dir, or to [`AppConfig::empty`] when there is none.
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    if let Some(path) = default_config_path().filter(|p| p.exists()) {
        return load_config(&path);
    }

    match dirs::data_local_dir() {
        Some(dir) => {
            let base = dir.join(APP_DIR_NAME);
            info!(data_dir = %base.display(), "no config file found, using system defaults");
            Ok(AppConfig::with_system_defaults(base))
        }
        None => {
            warn!("no config file and no platform data dir, durable storage disabled");
            Ok(AppConfig::empty())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_load_config_reads_valid_toml() {
        let file = write_config(
            r#"
            [general]
            environment = "development"

            [storage]
            data_dir = "/tmp/fiscaldesk"
            quota_bytes = 1024

            [backend]
            url = "https://project.example.co"
            api_key = "anon"

            [alerts]
            payment_check_interval_secs = 60
        "#,
        );

        let config = load_config(file.path()).unwrap();

        assert!(config.environment.is_development());
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/fiscaldesk"));
        assert_eq!(config.storage.quota_bytes, 1024);
        assert_eq!(config.backend.url, "https://project.example.co");
        assert_eq!(config.alerts.payment_check_interval_secs, 60);
    }

    #[test]
    fn test_load_config_returns_empty_values_when_missing() {
        let file = write_config(
            r#"
            [storage]
            # data_dir is missing

            [backend]
            # url is missing
        "#,
        );

        let config = load_config(file.path()).unwrap();

        assert_eq!(config, AppConfig::empty());
    }

    #[test]
    fn test_load_config_does_not_validate_values() {
        let file = write_config(
            r#"
            [backend]
            url = "not a url"

            [onboarding]
            ttl_hours = 0
        "#,
        );

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.backend.url, "not a url");
        assert_eq!(config.onboarding.ttl_hours, 0);
    }

    #[test]
    fn test_load_config_returns_io_error_on_file_not_found() {
        let result = load_config(Path::new("/nonexistent/fiscaldesk/config.toml"));

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_returns_parse_error_on_invalid_toml() {
        let file = write_config("[storage\ndata_dir = ");

        let message = format!("{:#}", load_config(file.path()).unwrap_err());
        assert!(message.contains("Failed to parse config as TOML"));
    }

    #[test]
    fn test_resolve_config_prefers_explicit_path() {
        let file = write_config("[general]\nenvironment = \"dev\"\n");

        let config = resolve_config(Some(file.path())).unwrap();

        assert!(config.environment.is_development());
    }

    #[test]
    fn test_resolve_config_explicit_missing_path_is_an_error() {
        assert!(resolve_config(Some(Path::new("/nonexistent/config.toml"))).is_err());
    }
}
