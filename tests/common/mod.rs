//! Common testing utilities for Vault Dump integration tests.

use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token accepted by [`MockVault::accept_token`].
#[allow(dead_code)]
pub const TEST_TOKEN: &str = "s.test-token";

/// Test context that stands in for the caller's home directory.
pub struct TestContext {
    /// Path to the temporary home directory
    pub home: PathBuf,
    /// The temporary directory (kept to prevent early deletion)
    _temp_dir: TempDir,
}

impl TestContext {
    /// Create a new test context with a temporary home directory.
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let home = temp_dir.path().to_path_buf();

        Ok(Self {
            home,
            _temp_dir: temp_dir,
        })
    }

    /// Create a file in the home directory.
    #[allow(dead_code)]
    pub fn create_file(&self, name: &str, content: &str) -> anyhow::Result<PathBuf> {
        let file_path = self.home.join(name);
        fs::write(&file_path, content)?;
        Ok(file_path)
    }

    /// Directory holding every dump made with this home.
    #[allow(dead_code)]
    pub fn dumps_dir(&self) -> PathBuf {
        self.home.join("vault-dump").join("dumps")
    }

    /// Every dump root created so far.
    #[allow(dead_code)]
    pub fn dump_roots(&self) -> Vec<PathBuf> {
        match fs::read_dir(self.dumps_dir()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// A wiremock server answering like a Vault KV v2 engine mounted at `secret/`.
pub struct MockVault {
    pub server: MockServer,
}

#[allow(dead_code)]
impl MockVault {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Answer token self-lookup for [`TEST_TOKEN`].
    pub async fn accept_token(&self) {
        Mock::given(method("GET"))
            .and(path("/v1/auth/token/lookup-self"))
            .and(header("x-vault-token", TEST_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": TEST_TOKEN, "policies": ["default"] }
            })))
            .mount(&self.server)
            .await;
    }

    /// Reject token self-lookup with 403.
    pub async fn reject_token(&self) {
        Mock::given(method("GET"))
            .and(path("/v1/auth/token/lookup-self"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "errors": ["permission denied"]
            })))
            .mount(&self.server)
            .await;
    }

    /// Serve a directory listing for `secret/metadata/{dir}`.
    pub async fn dir(&self, dir: &str, keys: &[&str]) {
        Mock::given(method("LIST"))
            .and(path(format!("/v1/secret/metadata/{dir}")))
            .and(header("x-vault-token", TEST_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "keys": keys }
            })))
            .mount(&self.server)
            .await;
    }

    /// Serve the current version of the secret at `secret/data/{leaf}`.
    pub async fn leaf(&self, leaf: &str, data: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/secret/data/{leaf}")))
            .and(header("x-vault-token", TEST_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "data": data,
                    "metadata": { "version": 1, "destroyed": false }
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer LIST on `secret/metadata/{dir}` with 403.
    pub async fn deny_list(&self, dir: &str) {
        Mock::given(method("LIST"))
            .and(path(format!("/v1/secret/metadata/{dir}")))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "errors": ["permission denied"]
            })))
            .mount(&self.server)
            .await;
    }

    /// Serve a small tree:
    ///
    /// ```text
    /// secret/
    /// ├── app
    /// ├── team/
    /// │   ├── db
    /// │   └── ops/
    /// │       └── pager
    /// └── zz-last
    /// ```
    pub async fn sample_tree(&self) {
        self.dir("", &["app", "team/", "zz-last"]).await;
        self.leaf("app", json!({"API_KEY": "sk_test_123", "DEBUG": false}))
            .await;
        self.dir("team/", &["db", "ops/"]).await;
        self.leaf("team/db", json!({"user": "admin", "port": 5432}))
            .await;
        self.dir("team/ops/", &["pager"]).await;
        self.leaf("team/ops/pager", json!({"token": "p-123"})).await;
        self.leaf("zz-last", json!({"nested": {"b": 1, "a": [1, 2, 3]}}))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_context_create_file() {
        let ctx = TestContext::new().unwrap();
        let file_path = ctx.create_file(".vault-token", "s.abc").unwrap();

        assert!(file_path.exists());
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "s.abc");
    }

    #[test]
    fn test_no_dumps_yet() {
        let ctx = TestContext::new().unwrap();
        assert!(ctx.dump_roots().is_empty());
    }
}
