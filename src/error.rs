use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsshError {
    // Resolution errors: the operator must narrow or fix the query
    #[error("no instances matched query '{0}'")]
    NoMatch(String),

    #[error("query '{query}' was too vague, {count} instances matched")]
    AmbiguousQuery { query: String, count: usize },

    // Infrastructure errors
    #[error("failed to fetch instances: {0}")]
    Fetch(String),

    #[error("cache error: {0}")]
    CacheIo(String),

    #[error("failed to resolve username for image {image}: {reason}")]
    UsernameResolution { image: String, reason: String },

    // Synthesis errors
    #[error("instance {0} has no public address; connect via a jump host or an ssm mode")]
    NoPublicAddress(String),

    // Config errors
    #[error("configuration error: {0}")]
    Config(String),

    // Session errors
    #[error("failed to run '{command}': {reason}")]
    Session { command: String, reason: String },

    // File/IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AsshError {
    pub fn fetch(err: impl std::fmt::Display) -> Self {
        AsshError::Fetch(err.to_string())
    }

    pub fn cache_io(err: impl std::fmt::Display) -> Self {
        AsshError::CacheIo(err.to_string())
    }

    pub fn username(image: &str, err: impl std::fmt::Display) -> Self {
        AsshError::UsernameResolution {
            image: image.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn session(command: &str, err: impl std::fmt::Display) -> Self {
        AsshError::Session {
            command: command.to_string(),
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AsshError>;
