//! Error types for a dump run.
//!
//! Nothing here is recoverable: every variant aborts the run where it is
//! raised, leaving whatever was already written on disk.

use std::path::PathBuf;

/// Everything that can stop a dump.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error(
        "There is no Vault token. Please set a token value in env var 'VAULT_TOKEN', \
         the '~/.vault-token' file, or the '-t' arg."
    )]
    MissingToken,

    #[error("Vault token cannot be sent as an HTTP header value")]
    InvalidToken,

    #[error("API request failed: {verb} {path} (status {status})")]
    RequestFailed {
        verb: String,
        path: String,
        status: u16,
    },

    #[error("network error during {verb} {path}")]
    Transport {
        verb: String,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response body for {verb} {path}: {reason}")]
    MalformedResponse {
        verb: String,
        path: String,
        reason: String,
    },

    #[error("Failed to authenticate to Vault at {address}")]
    AuthenticationFailed {
        address: String,
        #[source]
        source: Box<DumpError>,
    },

    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("failed to determine home directory")]
    HomeDirUnavailable,

    #[error("dump directory already exists: {0:?}")]
    DumpRootExists(PathBuf),

    #[error("two secrets map to the same output file: {0:?}")]
    OutputCollision(PathBuf),

    #[error("filesystem error at {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DumpError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
