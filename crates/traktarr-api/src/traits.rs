/// Source of the bearer credential attached to every API request.
pub trait AuthProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Current access token, or `None` when not signed in.
    fn access_token(&self) -> Option<String>;
}
