use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::LaunchError;

/// The document the mock API serves. Records are owned by the mock API, so
/// they stay opaque JSON here.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogStore {
    pub media: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Created,
    Existing,
}

/// Makes sure the catalog store exists before the mock API is pointed at it.
///
/// An existing file is left exactly as it is, whatever it contains. A missing
/// one is created with an empty `media` list. Parent directories are not
/// created.
pub fn ensure_store(path: &Path) -> Result<StoreStatus, LaunchError> {
    if path.exists() {
        debug!(path = %path.display(), "catalog store already present");
        return Ok(StoreStatus::Existing);
    }

    match write_empty_store(path) {
        Ok(()) => {
            info!(path = %path.display(), "created catalog store");
            Ok(StoreStatus::Created)
        }
        // Someone else created it between the check and the open.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(StoreStatus::Existing),
        Err(source) => Err(LaunchError::Store {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_empty_store(path: &Path) -> io::Result<()> {
    let json = serde_json::to_string(&CatalogStore::default())?;
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(json.as_bytes())?;
    file.flush()
}
