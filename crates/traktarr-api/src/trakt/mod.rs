pub mod auth;
pub mod client;

pub use auth::{DeviceCode, OAuthClient, TokenAuth, TokenInfo};
pub use client::{TraktService, TraktSettings};
