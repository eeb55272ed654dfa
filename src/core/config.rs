use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CbrProviderConfig {
    #[serde(default = "default_cbr_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CbrProviderConfig {
    fn default() -> Self {
        CbrProviderConfig {
            base_url: default_cbr_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub cbr: CbrProviderConfig,
}

/// Initial values of the converter shown on the dashboard.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConverterConfig {
    #[serde(default = "default_amount")]
    pub amount: f64,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_to")]
    pub to: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            amount: default_amount(),
            from: default_from(),
            to: default_to(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_refresh_interval_minutes")]
    pub refresh_interval_minutes: u64,
    #[serde(default)]
    pub converter: ConverterConfig,
}

fn default_cbr_url() -> String {
    "https://www.cbr-xml-daily.ru".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_amount() -> f64 {
    1.0
}

fn default_from() -> String {
    "USD".to_string()
}

fn default_to() -> String {
    "EUR".to_string()
}

fn default_refresh_interval_minutes() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            refresh_interval_minutes: default_refresh_interval_minutes(),
            converter: ConverterConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or the built-in defaults
    /// when no file has been set up.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "ratewatch", "ratewatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_minutes == 0 {
            bail!("refresh_interval_minutes must be greater than zero");
        }
        if self.providers.cbr.timeout_secs == 0 {
            bail!("providers.cbr.timeout_secs must be greater than zero");
        }
        if !self.converter.amount.is_finite() || self.converter.amount < 0.0 {
            bail!("converter.amount must be a non-negative number");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.providers.cbr.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  cbr:
    base_url: "http://example.com/cbr"
    timeout_secs: 5
refresh_interval_minutes: 10
converter:
  amount: 250
  from: "CNY"
  to: "usd"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.providers.cbr.base_url, "http://example.com/cbr");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.refresh_interval(), Duration::from_secs(600));
        assert_eq!(config.converter.amount, 250.0);
        assert_eq!(config.converter.from, "CNY");
        assert_eq!(config.converter.to, "usd");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.providers.cbr.base_url, "https://www.cbr-xml-daily.ru");
        assert_eq!(config.refresh_interval(), Duration::from_secs(30 * 60));
        assert_eq!(config.converter.from, "USD");
        assert_eq!(config.converter.to, "EUR");

        let partial: AppConfig = serde_yaml::from_str(
            r#"
providers:
  cbr:
    base_url: "http://localhost:8080"
"#,
        )
        .unwrap();
        assert_eq!(partial.providers.cbr.timeout_secs, 15);
        assert_eq!(partial.refresh_interval_minutes, 30);
    }

    #[test]
    fn test_invalid_values_are_rejected() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "refresh_interval_minutes: 0\n")?;

        let err = AppConfig::load_from_path(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("refresh_interval_minutes"));

        let config = AppConfig {
            converter: ConverterConfig {
                amount: -5.0,
                ..ConverterConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = AppConfig::load_from_path("/nonexistent/ratewatch.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
