use crate::core::store::{StoreOptions, DEFAULT_PAGE_SIZE};
use crate::utils::error::{Result, VessError};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_initial_page")]
    pub initial_page: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_initial_page() -> u32 {
    1
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
            token: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            initial_page: default_initial_page(),
        }
    }
}

impl AppConfig {
    /// Loads a TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(VessError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| VessError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| VessError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.api.timeout_seconds.map(Duration::from_secs)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            initial_page: self.store.initial_page,
            limit: self.store.page_size,
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        if let Some(token) = &self.api.token {
            validate_non_empty_string("api.token", token)?;
        }
        if let Some(timeout) = self.api.timeout_seconds {
            validate_range("api.timeout_seconds", timeout, 1, 600)?;
        }
        validate_range("store.page_size", self.store.page_size, 1, 100)?;
        validate_positive_number("store.initial_page", self.store.initial_page, 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.store.page_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config_with_env_substitution() {
        std::env::set_var("VESS_TEST_TOKEN_7781", "secret-token");
        let config = AppConfig::from_toml_str(
            r#"
[api]
base_url = "https://vess.example.org/api"
timeout_seconds = 30
token = "${VESS_TEST_TOKEN_7781}"

[store]
page_size = 20
initial_page = 2

[logging]
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.api.token.as_deref(), Some("secret-token"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(
            config.store_options(),
            StoreOptions {
                initial_page: 2,
                limit: 20
            }
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_variable_is_left_untouched() {
        let config = AppConfig::from_toml_str(
            r#"
[api]
token = "${VESS_SURELY_UNSET_VARIABLE}"
"#,
        )
        .unwrap();
        assert_eq!(
            config.api.token.as_deref(),
            Some("${VESS_SURELY_UNSET_VARIABLE}")
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.store.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.api.token = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[store]\npage_size = 5").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.store.page_size, 5);
        assert!(AppConfig::from_file("/definitely/not/here.toml").is_err());
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let err = AppConfig::from_toml_str("[store\npage_size = ").unwrap_err();
        assert!(matches!(err, VessError::ConfigError { .. }));
    }
}
