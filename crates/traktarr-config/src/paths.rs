use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Environment variable that relocates every traktarr directory.
pub const CONFIG_DIR_ENV: &str = "TRAKTARR_CONFIG_DIR";

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self, ConfigError> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(Self::with_base(PathBuf::from(dir)));
        }

        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("traktarr");
        let data_dir = dirs::data_dir()
            .map(|d| d.join("traktarr"))
            .unwrap_or_else(|| config_dir.join("data"));

        Ok(Self {
            log_dir: data_dir.join("logs"),
            config_dir,
            data_dir,
        })
    }

    /// Keep everything under one directory (tests, portable installs).
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    pub fn log_file_name(&self) -> &'static str {
        "traktarr.log"
    }

    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_layout() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path().to_path_buf());

        assert_eq!(paths.config_file(), dir.path().join("config.toml"));
        assert_eq!(paths.credentials_file(), dir.path().join("credentials.toml"));
        assert_eq!(paths.export_dir(), dir.path().join("data").join("exports"));

        paths.ensure_directories().unwrap();
        assert!(paths.log_dir().is_dir());
        assert!(paths.data_dir().is_dir());
    }
}
