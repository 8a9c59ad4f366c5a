//! On-disk model directories.

use anyhow::Result;
use modelgate_runtime::provision::MANIFEST_FILE;
use std::path::{Path, PathBuf};

/// Create `<models_dir>/<key>/model.toml` naming `backend`.
pub fn write_model_dir(models_dir: &Path, key: &str, backend: &str) -> Result<PathBuf> {
    write_manifest(models_dir, key, &format!("backend = \"{}\"\n", backend))
}

/// Create `<models_dir>/<key>/model.toml` with raw TOML content.
pub fn write_manifest(models_dir: &Path, key: &str, content: &str) -> Result<PathBuf> {
    let dir = models_dir.join(key);
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join(MANIFEST_FILE), content)?;
    Ok(dir)
}
