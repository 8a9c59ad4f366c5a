use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::ProvisionError;
use crate::backend::{BackendRegistry, Device, LoadedModel};

pub const MANIFEST_FILE: &str = "model.toml";

/// Resident model: the loaded backend object plus where and when it was loaded.
///
/// Shared as `Arc<ModelHandle>` by every request for the same key.
pub struct ModelHandle {
    key: String,
    model: Box<dyn LoadedModel>,
    device: Device,
    loaded_at: DateTime<Utc>,
}

impl ModelHandle {
    pub fn new(key: impl Into<String>, model: Box<dyn LoadedModel>) -> Self {
        let device = model.device();
        Self {
            key: key.into(),
            model,
            device,
            loaded_at: Utc::now(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn model(&self) -> &dyn LoadedModel {
        self.model.as_ref()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("key", &self.key)
            .field("device", &self.device)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

/// Materializes model handles. Called on a blocking thread.
pub trait ModelProvisioner: Send + Sync {
    fn load(&self, key: &str) -> Result<ModelHandle, ProvisionError>;

    /// Where the artifacts for `key` are expected, for status reporting.
    fn artifact_path(&self, key: &str) -> PathBuf;
}

/// Contents of `<models_dir>/<key>/model.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Name of a registered backend.
    pub backend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Backend-side model name, when it differs from the directory name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
}

impl ModelManifest {
    pub fn read(dir: &Path) -> Result<Self, String> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("invalid {}: {}", path.display(), e))
    }
}

/// Loads models from one directory per key under `models_dir`.
#[derive(Debug)]
pub struct FsProvisioner {
    models_dir: PathBuf,
    backends: BackendRegistry,
}

impl FsProvisioner {
    pub fn new(models_dir: impl Into<PathBuf>, backends: BackendRegistry) -> Self {
        Self {
            models_dir: models_dir.into(),
            backends,
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }
}

impl ModelProvisioner for FsProvisioner {
    fn load(&self, key: &str) -> Result<ModelHandle, ProvisionError> {
        let dir = self.artifact_path(key);
        if !dir.is_dir() {
            return Err(ProvisionError::NotFound {
                key: key.to_string(),
                path: dir.display().to_string(),
            });
        }

        let failure = |reason: String| ProvisionError::LoadFailure {
            key: key.to_string(),
            reason,
        };

        let manifest = ModelManifest::read(&dir).map_err(failure)?;
        let backend = self.backends.get(&manifest.backend).ok_or_else(|| {
            failure(format!(
                "backend '{}' is not available (known: {})",
                manifest.backend,
                self.backends.names().join(", ")
            ))
        })?;

        tracing::debug!(model = key, backend = backend.name(), path = %dir.display(), "constructing model");
        let model = backend.load(&dir, &manifest).map_err(failure)?;
        Ok(ModelHandle::new(key, model))
    }

    fn artifact_path(&self, key: &str) -> PathBuf {
        self.models_dir.join(key)
    }
}
