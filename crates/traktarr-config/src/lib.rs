pub mod config;
pub mod credentials;
pub mod error;
pub mod paths;

pub use config::{Config, ExportConfig, FetchConfig, TraktConfig, DEFAULT_API_URL, OOB_REDIRECT_URI};
pub use credentials::{FileStore, KeyValueStore, MemoryStore};
pub use error::ConfigError;
pub use paths::PathManager;
