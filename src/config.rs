// Vault Dump Configuration Module
//
// This module resolves the Vault address and token once at startup, from
// CLI flags, environment variables and the ~/.vault-token file.

use crate::error::DumpError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the Vault server address.
pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";

/// Environment variable holding the Vault token.
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";

/// Address used when neither a flag nor `VAULT_ADDR` is given.
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1";

/// Token file name, relative to the home directory.
pub const TOKEN_FILE_NAME: &str = ".vault-token";

/// Every place a credential can come from, in no particular order.
///
/// Kept separate from the process environment so the precedence rules
/// can be exercised without touching global state.
#[derive(Debug, Default, Clone)]
pub struct CredentialSources {
    /// Value of `-a/--address`
    pub address_flag: Option<String>,

    /// Value of `-t/--token`
    pub token_flag: Option<String>,

    /// Value of `$VAULT_ADDR`
    pub address_env: Option<String>,

    /// Value of `$VAULT_TOKEN`
    pub token_env: Option<String>,

    /// Location of the token file (normally `~/.vault-token`)
    pub token_file: Option<PathBuf>,
}

impl CredentialSources {
    /// Collect sources from the CLI flags and the current process environment.
    pub fn from_env(address_flag: Option<String>, token_flag: Option<String>) -> Self {
        Self {
            address_flag,
            token_flag,
            address_env: std::env::var(VAULT_ADDR_ENV).ok(),
            token_env: std::env::var(VAULT_TOKEN_ENV).ok(),
            token_file: default_token_file(),
        }
    }
}

/// Get the default token file path: `~/.vault-token`.
pub fn default_token_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(TOKEN_FILE_NAME))
}

/// Resolved Vault credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Server address without a trailing slash
    pub address: String,

    /// Token sent as `X-Vault-Token`
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from the given sources.
    ///
    /// Priority:
    /// 1. address: flag, `$VAULT_ADDR`, then [`DEFAULT_ADDRESS`]
    /// 2. token: flag, `$VAULT_TOKEN`, then the token file
    ///
    /// # Errors
    ///
    /// Returns [`DumpError::MissingToken`] when no token source yields a value,
    /// or an I/O error if the token file exists but cannot be read.
    pub fn resolve(sources: CredentialSources) -> Result<Self, DumpError> {
        let address = sources
            .address_flag
            .or(sources.address_env)
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        let token = match sources.token_flag.or(sources.token_env) {
            Some(token) => token,
            None => match sources.token_file.as_deref() {
                Some(path) => read_token_file(path)?.ok_or(DumpError::MissingToken)?,
                None => return Err(DumpError::MissingToken),
            },
        };

        Ok(Self {
            address: address.trim_end_matches('/').to_string(),
            token,
        })
    }
}

/// Read the token file if it is a regular file.
///
/// The content is returned as-is, trailing newline included.
fn read_token_file(path: &Path) -> Result<Option<String>, DumpError> {
    if !path.is_file() {
        return Ok(None);
    }

    let token = std::fs::read_to_string(path).map_err(|e| DumpError::io(path, e))?;

    if token.len() != token.trim_end().len() {
        tracing::warn!(
            path = %path.display(),
            "token file has trailing whitespace; it is sent unmodified"
        );
    }

    Ok(Some(token))
}
