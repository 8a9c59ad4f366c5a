use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Mutex;

use crate::ProvisionError;
use crate::provision::{ModelHandle, ModelProvisioner};

/// Reports which model keys are currently resident.
pub trait ResourceProbe: Send + Sync {
    fn is_resident(&self, key: &str) -> bool;

    fn resident_keys(&self) -> Vec<String>;
}

/// One cache entry. Slots are created on first use and never removed.
#[derive(Default)]
struct Slot {
    /// Owned by the provisioning task for the whole load, so a load that
    /// outlives its caller still blocks a second load of the same key.
    load_lock: Arc<Mutex<()>>,
    resident: RwLock<Option<Arc<ModelHandle>>>,
}

impl Slot {
    fn current(&self) -> Option<Arc<ModelHandle>> {
        self.resident
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, handle: Arc<ModelHandle>) {
        *self.resident.write().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn take(&self) -> Option<Arc<ModelHandle>> {
        self.resident
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Lazily populated, write-once-per-key cache of model handles.
///
/// Concurrent `resolve` calls for one key converge on a single provisioning
/// call; calls for different keys never wait on each other. A load keeps
/// running after its caller times out or goes away, and its handle becomes
/// resident when it finishes.
pub struct ModelCache {
    provisioner: Arc<dyn ModelProvisioner>,
    provision_timeout: Duration,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
}

impl ModelCache {
    pub fn new(provisioner: Arc<dyn ModelProvisioner>, provision_timeout: Duration) -> Self {
        Self {
            provisioner,
            provision_timeout,
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &str) -> Arc<Slot> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.to_string()).or_default())
    }

    /// Return the resident handle for `key`, provisioning it on first use.
    ///
    /// Waiting for another caller's load counts against the same timeout.
    pub async fn resolve(&self, key: &str) -> Result<Arc<ModelHandle>, ProvisionError> {
        let slot = self.slot(key);
        if let Some(handle) = slot.current() {
            return Ok(handle);
        }

        match tokio::time::timeout(self.provision_timeout, self.load_into(slot, key)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    model = key,
                    timeout_secs = self.provision_timeout.as_secs(),
                    "model provisioning timed out"
                );
                Err(ProvisionError::LoadFailure {
                    key: key.to_string(),
                    reason: format!(
                        "provisioning did not finish within {}s",
                        self.provision_timeout.as_secs()
                    ),
                })
            }
        }
    }

    async fn load_into(
        &self,
        slot: Arc<Slot>,
        key: &str,
    ) -> Result<Arc<ModelHandle>, ProvisionError> {
        let loading = Arc::clone(&slot.load_lock).lock_owned().await;
        // Another caller may have finished loading while we waited.
        if let Some(handle) = slot.current() {
            return Ok(handle);
        }

        tracing::info!(model = key, "provisioning model");
        let provisioner = Arc::clone(&self.provisioner);
        let owned_key = key.to_string();
        let task = tokio::task::spawn_blocking(move || {
            let _loading = loading;
            let started = Instant::now();
            match provisioner.load(&owned_key) {
                Ok(handle) => {
                    let handle = Arc::new(handle);
                    tracing::info!(
                        model = %owned_key,
                        device = %handle.device(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "model resident"
                    );
                    slot.store(Arc::clone(&handle));
                    Ok(handle)
                }
                Err(err) => {
                    tracing::error!(model = %owned_key, error = %err, "model provisioning failed");
                    Err(err)
                }
            }
        });

        task.await.unwrap_or_else(|join_err| {
            tracing::error!(model = key, error = %join_err, "provisioning worker failed");
            Err(ProvisionError::LoadFailure {
                key: key.to_string(),
                reason: format!("provisioning worker failed: {}", join_err),
            })
        })
    }

    /// Drop the resident handle for `key`. Returns whether one was resident.
    ///
    /// In-flight requests keep their `Arc` until they finish; the next
    /// `resolve` provisions a fresh handle.
    pub fn evict(&self, key: &str) -> bool {
        let slot = match self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            Some(slot) => Arc::clone(slot),
            None => return false,
        };

        let evicted = slot.take().is_some();
        if evicted {
            tracing::info!(model = key, "model evicted");
        }
        evicted
    }

    pub fn handle(&self, key: &str) -> Option<Arc<ModelHandle>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .and_then(|slot| slot.current())
    }

    pub fn artifact_path(&self, key: &str) -> PathBuf {
        self.provisioner.artifact_path(key)
    }

    /// Provision `keys` concurrently. Failures are logged; returns how many
    /// keys are resident afterwards.
    pub async fn warm<I, S>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<S> = keys.into_iter().collect();
        let results = join_all(keys.iter().map(|key| self.resolve(key.as_ref()))).await;

        results
            .into_iter()
            .zip(&keys)
            .filter(|(result, key)| match result {
                Ok(_) => true,
                Err(err) => {
                    tracing::warn!(model = key.as_ref(), error = %err, "preload failed");
                    false
                }
            })
            .count()
    }
}

impl ResourceProbe for ModelCache {
    fn is_resident(&self, key: &str) -> bool {
        self.handle(key).is_some()
    }

    fn resident_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, slot)| slot.current().is_some())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}
