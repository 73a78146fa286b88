//! Error types for gitpub

use thiserror::Error;

/// Result type alias for gitpub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gitpub operations
#[derive(Error, Debug)]
pub enum Error {
    /// The target remote could not be contacted (network or auth failure)
    #[error("Remote {url} unreachable: {message}")]
    RemoteUnreachable {
        /// URL of the remote that could not be reached
        url: String,
        /// Underlying failure reported by the transport
        message: String,
    },

    /// Malformed branch name, rejected before any network traffic
    #[error("Invalid branch name: {0}")]
    InvalidBranch(String),

    /// Filesystem failure during cleanup, copy, or checkout
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Git failure that is not a transport problem
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

impl Error {
    pub(crate) fn remote_unreachable(url: impl Into<String>, err: &git2::Error) -> Self {
        Error::RemoteUnreachable {
            url: url.into(),
            message: err.message().to_string(),
        }
    }

    /// Classify a git2 error raised while talking to `url`.
    ///
    /// Transport and authentication failures become [`Error::RemoteUnreachable`];
    /// everything else stays a plain git error.
    pub(crate) fn from_transport(url: &str, err: git2::Error) -> Self {
        match err.class() {
            git2::ErrorClass::Net | git2::ErrorClass::Http | git2::ErrorClass::Ssh => {
                Self::remote_unreachable(url, &err)
            }
            _ if err.code() == git2::ErrorCode::Auth => Self::remote_unreachable(url, &err),
            _ => Error::Git(err),
        }
    }
}
