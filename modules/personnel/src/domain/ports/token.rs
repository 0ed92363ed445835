use std::io;

/// Durable storage for the session token, so a later process can restore
/// the session.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// Where outgoing API calls get their bearer token. `None` means the call
/// must not be made.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}
