use std::{
    env,
    path::{Path, PathBuf},
};

use crate::error::LaunchError;

/// Anchors a possibly relative path at the current working directory.
pub fn resolve_cwd(path: &Path) -> Result<PathBuf, LaunchError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir()
        .map_err(|e| LaunchError::Config(format!("failed to get current directory: {}", e)))?;
    Ok(cwd.join(path))
}

/// Resolves `reference` against `base` unless it is already absolute.
pub fn resolve_path(reference: &Path, base: &Path) -> PathBuf {
    if reference.is_absolute() {
        reference.to_path_buf()
    } else {
        base.join(reference)
    }
}
