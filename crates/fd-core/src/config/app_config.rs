use std::path::PathBuf;

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    /// Anything other than `"development"` / `"dev"` is production.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory of the durable storage file (empty = durable storage unavailable)
    pub data_dir: PathBuf,
    /// Byte quota of the durable storage area (0 = unlimited)
    pub quota_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Obfuscation key for secure storage (empty = built-in key)
    pub obfuscation_key: String,
    pub allow_plaintext_fallback: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingConfig {
    /// Lifetime of saved onboarding progress (0 = 24h)
    pub ttl_hours: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertsConfig {
    /// Payment alert polling period (0 = no polling)
    pub payment_check_interval_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Directory for the log file (empty = stdout only)
    pub log_dir: PathBuf,
}

/// Application configuration DTO (pure data, no logic)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub environment: Environment,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub onboarding: OnboardingConfig,
    pub backend: BackendConfig,
    pub alerts: AlertsConfig,
    pub logging: LoggingConfig,
}

fn str_at<'a>(value: &'a toml::Value, section: &str, key: &str) -> &'a str {
    value
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn u64_at(value: &toml::Value, section: &str, key: &str) -> u64 {
    value
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .map(|v| v.max(0) as u64)
        .unwrap_or(0)
}

fn bool_at(value: &toml::Value, section: &str, key: &str) -> bool {
    value
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

impl AppConfig {
    /// Create AppConfig from a TOML value.
    ///
    /// Must not contain validation or default-value logic: empty strings and
    /// zeroes are valid "facts".
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        Ok(Self {
            environment: Environment::parse(str_at(toml_value, "general", "environment")),
            storage: StorageConfig {
                data_dir: PathBuf::from(str_at(toml_value, "storage", "data_dir")),
                quota_bytes: u64_at(toml_value, "storage", "quota_bytes"),
            },
            security: SecurityConfig {
                obfuscation_key: str_at(toml_value, "security", "obfuscation_key").to_string(),
                allow_plaintext_fallback: bool_at(
                    toml_value,
                    "security",
                    "allow_plaintext_fallback",
                ),
            },
            onboarding: OnboardingConfig {
                ttl_hours: u64_at(toml_value, "onboarding", "ttl_hours"),
            },
            backend: BackendConfig {
                url: str_at(toml_value, "backend", "url").to_string(),
                api_key: str_at(toml_value, "backend", "api_key").to_string(),
            },
            alerts: AlertsConfig {
                payment_check_interval_secs: u64_at(
                    toml_value,
                    "alerts",
                    "payment_check_interval_secs",
                ),
            },
            logging: LoggingConfig {
                log_dir: PathBuf::from(str_at(toml_value, "logging", "log_dir")),
            },
        })
    }

    /// Create empty AppConfig (all empty/default values)
    pub fn empty() -> Self {
        Self::default()
    }

    /// AppConfig with durable storage and logs under `data_dir`.
    ///
    /// The base directory is computed by the caller (e.g. with `dirs`).
    pub fn with_system_defaults(data_dir: PathBuf) -> Self {
        Self {
            storage: StorageConfig {
                data_dir: data_dir.join("storage"),
                quota_bytes: 0,
            },
            logging: LoggingConfig {
                log_dir: data_dir.join("logs"),
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml::Value;

    #[test]
    fn test_from_toml_reads_every_section() {
        let toml_str = r#"
            [general]
            environment = "development"

            [storage]
            data_dir = "/var/lib/fiscaldesk"
            quota_bytes = 5242880

            [security]
            obfuscation_key = "segredo"
            allow_plaintext_fallback = true

            [onboarding]
            ttl_hours = 48

            [backend]
            url = "https://project.example.co"
            api_key = "anon"

            [alerts]
            payment_check_interval_secs = 300

            [logging]
            log_dir = "/var/log/fiscaldesk"
        "#;
        let toml_value: Value = toml::from_str(toml_str).unwrap();

        let config = AppConfig::from_toml(&toml_value).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/fiscaldesk"));
        assert_eq!(config.storage.quota_bytes, 5_242_880);
        assert_eq!(config.security.obfuscation_key, "segredo");
        assert!(config.security.allow_plaintext_fallback);
        assert_eq!(config.onboarding.ttl_hours, 48);
        assert_eq!(config.backend.url, "https://project.example.co");
        assert_eq!(config.backend.api_key, "anon");
        assert_eq!(config.alerts.payment_check_interval_secs, 300);
        assert_eq!(config.logging.log_dir, PathBuf::from("/var/log/fiscaldesk"));
    }

    #[test]
    fn test_from_toml_missing_values_are_empty() {
        let toml_value: Value = toml::from_str("[general]\n").unwrap();

        let config = AppConfig::from_toml(&toml_value).unwrap();

        assert_eq!(config, AppConfig::empty());
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_negative_numbers_map_to_zero() {
        let toml_value: Value = toml::from_str("[storage]\nquota_bytes = -1\n").unwrap();
        let config = AppConfig::from_toml(&toml_value).unwrap();
        assert_eq!(config.storage.quota_bytes, 0);
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("Development"), Environment::Development);
        assert_eq!(Environment::parse(" dev "), Environment::Development);
        assert_eq!(Environment::parse("staging"), Environment::Production);
        assert_eq!(Environment::parse(""), Environment::Production);
    }

    #[test]
    fn test_with_system_defaults() {
        let config = AppConfig::with_system_defaults(PathBuf::from("/data"));
        assert_eq!(config.storage.data_dir, PathBuf::from("/data/storage"));
        assert_eq!(config.logging.log_dir, PathBuf::from("/data/logs"));
        assert!(config.backend.url.is_empty());
    }
}
