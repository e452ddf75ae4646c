pub mod auth;
pub mod browse;
pub mod config;
pub mod export;
pub mod progress;
pub mod prompts;

use color_eyre::eyre::{eyre, Result};
use std::sync::Arc;
use traktarr_api::{OAuthClient, TokenAuth, TraktService, TraktSettings};
use traktarr_config::{Config, FileStore, KeyValueStore, PathManager};

/// Everything a Trakt-facing command needs, built once per invocation.
pub struct Session {
    pub paths: PathManager,
    pub config: Config,
    pub settings: TraktSettings,
    pub auth: Arc<TokenAuth>,
}

impl Session {
    pub fn load() -> Result<Self> {
        let paths = PathManager::new()
            .map_err(|e| eyre!("Failed to determine configuration directories: {}", e))?;
        let config = load_config(&paths)?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration: {}", e))?;

        let trakt = config
            .trakt
            .as_ref()
            .filter(|_| config.is_trakt_configured())
            .ok_or_else(|| eyre!("Trakt is not configured. Run `traktarr config trakt` first."))?;
        let settings = TraktSettings::from_config(trakt, &config.fetch);

        let credentials_file = paths.credentials_file();
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(credentials_file.clone()).map_err(|e| {
            eyre!(
                "Failed to load credentials from {}: {}",
                credentials_file.display(),
                e
            )
        })?);

        Ok(Self {
            paths,
            config,
            settings,
            auth: Arc::new(TokenAuth::new(store)),
        })
    }

    pub fn service(&self) -> Result<TraktService> {
        TraktService::new(self.settings.clone(), self.auth.clone())
            .map_err(|e| eyre!("Failed to create Trakt client: {}", e))
    }

    pub fn oauth(&self) -> Result<OAuthClient> {
        OAuthClient::new(self.settings.clone())
            .map_err(|e| eyre!("Failed to create Trakt OAuth client: {}", e))
    }
}

pub fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
}
