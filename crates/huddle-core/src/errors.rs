use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HuddleError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("call error: {0}")]
    Call(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("invalid meeting code: {0}")]
    InvalidCode(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not signed in")]
    NotSignedIn,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for HuddleError {
    fn from(e: reqwest::Error) -> Self {
        HuddleError::Http(e.to_string())
    }
}
