//! Vault HTTP client for the KV v2 secrets engine.
//!
//! # Requests
//!
//! - `GET  {address}/v1/auth/token/lookup-self` - token check
//! - `LIST {address}/v1/{mount}metadata/{path}` - child keys of a directory
//! - `GET  {address}/v1/{mount}data/{path}` - current version of a secret
//!
//! Every request is a single attempt: no retries, no timeout, no backoff.
//! Anything but `200 OK` is an error.

use crate::config::Credentials;
use crate::error::DumpError;
use crate::export::SecretStore;
use reqwest::header::HeaderValue;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Header carrying the Vault token.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// Token self-lookup endpoint, relative to `/v1/`.
pub const LOOKUP_SELF_PATH: &str = "auth/token/lookup-self";

/// HTTP verbs issued against Vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    List,
}

impl Verb {
    fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::List => "LIST",
        }
    }

    fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::List => Method::from_bytes(b"LIST").expect("LIST is a valid method token"),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{"data": {"keys": [...]}}`
#[derive(Deserialize)]
struct ListResponse {
    data: KeyList,
}

#[derive(Deserialize)]
struct KeyList {
    keys: Vec<String>,
}

/// `{"data": {"data": {...}, "metadata": {...}}}`
#[derive(Deserialize)]
struct ReadResponse {
    data: SecretVersion,
}

#[derive(Deserialize)]
struct SecretVersion {
    data: Value,
}

/// Authenticated Vault REST client.
#[derive(Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    address: String,
    token: String,
}

impl fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClient")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl VaultClient {
    fn user_agent() -> String {
        format!("vault-dump/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Create a client that sends `credentials.token` on every request.
    ///
    /// The token is only checked when a request is built, so a value that
    /// cannot be a header (a token file ending in a newline, for instance)
    /// surfaces from [`VaultClient::check_token`] as an authentication failure.
    pub fn new(credentials: &Credentials) -> Result<Self, DumpError> {
        let http = reqwest::Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(DumpError::ClientBuild)?;

        Ok(Self {
            http,
            address: credentials.address.clone(),
            token: credentials.token.clone(),
        })
    }

    fn token_header(&self) -> Result<HeaderValue, DumpError> {
        let mut token = HeaderValue::from_str(&self.token).map_err(|_| DumpError::InvalidToken)?;
        token.set_sensitive(true);
        Ok(token)
    }

    /// Issue one authenticated request against `{address}/v1/{path}` and
    /// parse the response body as JSON.
    pub async fn request(&self, verb: Verb, path: &str) -> Result<Value, DumpError> {
        let url = format!("{}/v1/{}", self.address, path);

        let resp = self
            .http
            .request(verb.method(), &url)
            .header(TOKEN_HEADER, self.token_header()?)
            .send()
            .await
            .map_err(|source| DumpError::Transport {
                verb: verb.to_string(),
                path: path.to_string(),
                source,
            })?;

        let status = resp.status();
        tracing::debug!(%verb, path, status = status.as_u16(), "vault request");

        if status != StatusCode::OK {
            return Err(DumpError::RequestFailed {
                verb: verb.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| DumpError::MalformedResponse {
                verb: verb.to_string(),
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Fail fast if the token is not accepted by the server.
    pub async fn check_token(&self) -> Result<(), DumpError> {
        self.request(Verb::Get, LOOKUP_SELF_PATH)
            .await
            .map(|_| ())
            .map_err(|e| DumpError::AuthenticationFailed {
                address: self.address.clone(),
                source: Box::new(e),
            })
    }
}

impl SecretStore for VaultClient {
    async fn list(&self, path: &str) -> Result<Vec<String>, DumpError> {
        let body = self.request(Verb::List, path).await?;
        let listing: ListResponse = decode(Verb::List, path, body)?;
        Ok(listing.data.keys)
    }

    async fn read(&self, path: &str) -> Result<Value, DumpError> {
        let body = self.request(Verb::Get, path).await?;
        let secret: ReadResponse = decode(Verb::Get, path, body)?;
        Ok(secret.data.data)
    }
}

fn decode<T: DeserializeOwned>(verb: Verb, path: &str, body: Value) -> Result<T, DumpError> {
    serde_json::from_value(body).map_err(|e| DumpError::MalformedResponse {
        verb: verb.to_string(),
        path: path.to_string(),
        reason: e.to_string(),
    })
}
