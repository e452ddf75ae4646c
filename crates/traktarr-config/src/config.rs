use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub trakt: Option<TraktConfig>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Page size for single-page requests
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Page size when walking every page
    #[serde(default = "default_bulk_page_limit")]
    pub bulk_page_limit: u32,
    /// Request `extended=full` records (runtime, genres)
    #[serde(default = "default_true")]
    pub extended_info: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_format")]
    pub format: String,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
    #[serde(default = "default_true")]
    pub include_history: bool,
    #[serde(default = "default_true")]
    pub include_watched: bool,
    #[serde(default = "default_true")]
    pub include_ratings: bool,
    #[serde(default = "default_true")]
    pub include_collection: bool,
    #[serde(default = "default_true")]
    pub include_stats: bool,
}

pub const DEFAULT_API_URL: &str = "https://api.trakt.tv";
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

fn default_true() -> bool {
    true
}

fn default_redirect_uri() -> String {
    OOB_REDIRECT_URI.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_user_agent() -> String {
    "traktarr".to_string()
}

fn default_page_limit() -> u32 {
    100
}

fn default_bulk_page_limit() -> u32 {
    1000
}

fn default_export_format() -> String {
    "json".to_string()
}

fn default_filename_prefix() -> String {
    "trakt-export".to_string()
}

impl TraktConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: default_redirect_uri(),
            api_url: default_api_url(),
            user_agent: default_user_agent(),
        }
    }

    fn has_credentials(&self) -> bool {
        !self.client_id.is_empty()
            && self.client_id != "YOUR_CLIENT_ID"
            && !self.client_secret.is_empty()
            && self.client_secret != "YOUR_CLIENT_SECRET"
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            bulk_page_limit: default_bulk_page_limit(),
            extended_info: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: default_export_format(),
            output_dir: None,
            filename_prefix: default_filename_prefix(),
            include_history: true,
            include_watched: true,
            include_ratings: true,
            include_collection: true,
            include_stats: true,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref trakt) = self.trakt {
            if !trakt.has_credentials() {
                return Err(ConfigError::Invalid(
                    "Trakt client_id and client_secret must be set".to_string(),
                ));
            }
            if !trakt.api_url.starts_with("http://") && !trakt.api_url.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "Trakt api_url must be an http(s) URL: {}",
                    trakt.api_url
                )));
            }
        }

        if self.fetch.page_limit == 0 || self.fetch.bulk_page_limit == 0 {
            return Err(ConfigError::Invalid(
                "page_limit and bulk_page_limit must be greater than zero".to_string(),
            ));
        }

        match self.export.format.as_str() {
            "json" | "csv" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "Unsupported export format: {}",
                    other
                )))
            }
        }

        Ok(())
    }

    pub fn is_trakt_configured(&self) -> bool {
        self.trakt
            .as_ref()
            .map(TraktConfig::has_credentials)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config {
            trakt: Some(TraktConfig::new("test_id", "test_secret")),
            ..Config::default()
        };
        config.export.format = "csv".to_string();
        config.save_to_file(file.path()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        let trakt = loaded.trakt.unwrap();
        assert_eq!(trakt.client_id, "test_id");
        assert_eq!(trakt.api_url, DEFAULT_API_URL);
        assert_eq!(loaded.export.format, "csv");
        assert_eq!(loaded.fetch.bulk_page_limit, 1000);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = toml::from_str(
            r#"
            [trakt]
            client_id = "abc"
            client_secret = "def"
            "#,
        )
        .unwrap();
        assert_eq!(config.fetch.page_limit, 100);
        assert_eq!(config.export.filename_prefix, "trakt-export");
        assert!(config.export.include_stats);
        assert_eq!(config.trakt.unwrap().redirect_uri, OOB_REDIRECT_URI);
    }

    #[test]
    fn test_validate() {
        let mut config = Config {
            trakt: Some(TraktConfig::new("YOUR_CLIENT_ID", "secret")),
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(!config.is_trakt_configured());

        config.trakt = Some(TraktConfig::new("id", "secret"));
        assert!(config.validate().is_ok());
        assert!(config.is_trakt_configured());

        config.fetch.page_limit = 0;
        assert!(config.validate().is_err());

        config.fetch.page_limit = 10;
        config.export.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert!(config.trakt.is_none());
    }
}
