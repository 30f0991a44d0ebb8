//! Location of the persisted credential store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

use leadr::clock::SystemClock;
use leadr::config::DEFAULT_NAMESPACE;
use leadr::store::DeviceFingerprint;
use leadr::{FileStore, TokenStore};

const STORE_FILE: &str = "credentials.json";

/// Resolve the store path, creating its parent directory.
pub fn store_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let dirs = ProjectDirs::from("", "", "leadr")
                .context("Could not determine data directory")?;
            dirs.data_dir().join(STORE_FILE)
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create data directory")?;
    }

    debug!(path = %path.display(), "Using credential store");

    Ok(path)
}

pub fn open_store(explicit: Option<&Path>) -> Result<Arc<FileStore>> {
    Ok(Arc::new(FileStore::new(store_path(explicit)?)))
}

/// Open the token store without a client, for commands that stay offline.
pub fn open_tokens(explicit: Option<&Path>) -> Result<TokenStore> {
    let store = open_store(explicit)?;
    Ok(TokenStore::load(
        store,
        DEFAULT_NAMESPACE,
        Arc::new(SystemClock),
        Arc::new(DeviceFingerprint),
    ))
}
