use thiserror::Error;
use traktarr_config::ConfigError;

#[derive(Error, Debug)]
pub enum TraktError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Trakt API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse Trakt response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Not authenticated with Trakt (run `traktarr auth login`)")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Credential store error: {0}")]
    Store(#[from] ConfigError),

    #[error("Waiting for the user to approve the device code")]
    AuthorizationPending,

    #[error("Polling too quickly, slow down")]
    SlowDown,

    #[error("The user denied the authorization request")]
    Denied,

    #[error("The device code expired before it was approved")]
    Expired,
}

impl TraktError {
    /// Device-flow outcomes that mean "keep polling".
    pub fn is_pending(&self) -> bool {
        matches!(self, TraktError::AuthorizationPending | TraktError::SlowDown)
    }
}
