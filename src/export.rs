//! Recursive export of a KV v2 mount onto the local filesystem.
//!
//! The secret tree is walked depth-first in the order the server lists keys.
//! A key ending in `/` is a directory and becomes a directory on disk; any
//! other key is a secret and becomes one pretty-printed `.json` file:
//!
//! ```text
//! secret/                      <root>/secret/
//! ├── app          (leaf)      ├── app.json
//! └── team/        (dir)       └── team/
//!     └── db       (leaf)          └── db.json
//! ```
//!
//! The first failing request aborts the walk. Files written before the
//! failure are left in place.

use crate::error::DumpError;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Mount exported by the CLI.
pub const DEFAULT_MOUNT: &str = "secret/";

/// Marker suffix of directory keys in a listing.
pub const DIRECTORY_MARKER: char = '/';

const SECRET_FILE_EXTENSION: &str = ".json";

/// Read access to a KV v2 engine.
///
/// Paths are full API paths relative to `/v1/`, e.g. `secret/metadata/team/`.
pub trait SecretStore {
    /// Child keys of a metadata path, in server order.
    fn list(&self, path: &str) -> impl Future<Output = Result<Vec<String>, DumpError>>;

    /// `data` of the current version of the secret at a data path.
    fn read(&self, path: &str) -> impl Future<Output = Result<Value, DumpError>>;
}

/// Counts of what an export wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub directories: usize,
    pub secrets: usize,
}

/// Walks a mount of a [`SecretStore`] and mirrors it under a dump root.
pub struct Exporter<'a, S> {
    store: &'a S,
    dump_root: PathBuf,
}

impl<'a, S: SecretStore> Exporter<'a, S> {
    pub fn new(store: &'a S, dump_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            dump_root: dump_root.into(),
        }
    }

    /// Export everything below `{mount}{relative_path}`.
    ///
    /// `mount` must end in `/`; `relative_path` is empty or ends in `/`.
    pub async fn export(
        &self,
        mount: &str,
        relative_path: &str,
    ) -> Result<ExportSummary, DumpError> {
        let mut summary = ExportSummary::default();

        let start = self.dump_root.join(format!("{mount}{relative_path}"));
        fs::create_dir_all(&start).map_err(|e| DumpError::io(&start, e))?;

        // One entry per directory being visited: its path and remaining keys.
        let mut stack = vec![(
            relative_path.to_string(),
            self.list_children(mount, relative_path).await?.into_iter(),
        )];

        loop {
            let Some((prefix, keys)) = stack.last_mut() else {
                break;
            };
            let Some(key) = keys.next() else {
                stack.pop();
                continue;
            };
            let path = format!("{prefix}{key}");

            if key.ends_with(DIRECTORY_MARKER) {
                let dir = self.dump_root.join(format!("{mount}{path}"));
                fs::create_dir_all(&dir).map_err(|e| DumpError::io(&dir, e))?;
                summary.directories += 1;

                let children = self.list_children(mount, &path).await?;
                stack.push((path, children.into_iter()));
            } else {
                self.fetch_secret(mount, &path).await?;
                summary.secrets += 1;
            }
        }

        Ok(summary)
    }

    async fn list_children(&self, mount: &str, path: &str) -> Result<Vec<String>, DumpError> {
        println!("{mount}{path}");
        let keys = self.store.list(&format!("{mount}metadata/{path}")).await?;
        Ok(keys)
    }

    async fn fetch_secret(&self, mount: &str, path: &str) -> Result<(), DumpError> {
        println!("{mount}{path}");
        let payload = self.store.read(&format!("{mount}data/{path}")).await?;

        let file = self.dump_root.join(secret_file_name(&format!("{mount}{path}")));
        let content = render_secret(&payload).map_err(|e| DumpError::io(&file, e.into()))?;
        write_new_file(&file, &content)?;

        tracing::debug!(file = %file.display(), "secret written");
        Ok(())
    }
}

/// File name of a leaf secret: the logical path plus `.json`, unless the key
/// already carries that extension.
pub fn secret_file_name(logical_path: &str) -> String {
    if logical_path.ends_with(SECRET_FILE_EXTENSION) {
        logical_path.to_string()
    } else {
        format!("{logical_path}{SECRET_FILE_EXTENSION}")
    }
}

/// Write `content` to a file that must not exist yet.
///
/// Two leaves mapping to one file (`app` and `app.json`) abort the run
/// instead of overwriting each other.
fn write_new_file(file: &Path, content: &[u8]) -> Result<(), DumpError> {
    let mut out = match OpenOptions::new().write(true).create_new(true).open(file) {
        Ok(out) => out,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(DumpError::OutputCollision(file.to_path_buf()));
        }
        Err(e) => return Err(DumpError::io(file, e)),
    };
    out.write_all(content).map_err(|e| DumpError::io(file, e))
}

/// Serialize a payload with 4-space indentation and a trailing newline.
pub fn render_secret(payload: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    payload.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}
