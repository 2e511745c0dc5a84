//! Dump root naming and creation.
//!
//! Each run writes under `~/vault-dump/dumps/<YYYY-MM-DD-HH-MM-SS>/`, named
//! after the UTC start time. A run never reuses the directory of an earlier
//! one and never removes old dumps.

use crate::error::DumpError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the home directory that holds all dumps.
pub const DUMPS_DIR: &str = "vault-dump/dumps";

/// `strftime` format of a dump directory name.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Format a dump directory name for the given instant.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Path of the dump root for a run started at `now` under `home`.
pub fn dump_root(home: &Path, now: DateTime<Utc>) -> PathBuf {
    home.join(DUMPS_DIR).join(timestamp(now))
}

/// Path of the dump root for a run starting now under the caller's home.
pub fn default_dump_root() -> Result<PathBuf, DumpError> {
    let home = dirs::home_dir().ok_or(DumpError::HomeDirUnavailable)?;
    Ok(dump_root(&home, Utc::now()))
}

/// Create the dump root and the directory of the mount being exported.
///
/// Parent directories are created as needed, but the timestamp directory
/// itself must not exist yet.
pub fn create_dump_root(root: &Path, mount: &str) -> Result<(), DumpError> {
    if let Some(parent) = root.parent() {
        fs::create_dir_all(parent).map_err(|e| DumpError::io(parent, e))?;
    }

    match fs::create_dir(root) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(DumpError::DumpRootExists(root.to_path_buf()));
        }
        Err(e) => return Err(DumpError::io(root, e)),
    }

    let mount_dir = root.join(mount);
    fs::create_dir_all(&mount_dir).map_err(|e| DumpError::io(&mount_dir, e))?;

    Ok(())
}
