//! Counting provisioner for cache and orchestrator tests.

use modelgate_runtime::{ModelHandle, ModelProvisioner, ProvisionError};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crate::scripted::ScriptedModel;

/// Provisioner that hands out scripted models and counts loads per key.
///
/// Delays run on the calling (blocking) thread, the way a real weight load
/// would occupy it.
pub struct StubProvisioner {
    default_model: ScriptedModel,
    models: HashMap<String, ScriptedModel>,
    delays: HashMap<String, Duration>,
    missing: HashSet<String>,
    failing: HashMap<String, String>,
    loads: Mutex<HashMap<String, usize>>,
    running: Mutex<HashMap<String, usize>>,
    peak_running: Mutex<HashMap<String, usize>>,
}

impl StubProvisioner {
    /// Every key loads a clone of `default_model`.
    pub fn new(default_model: ScriptedModel) -> Self {
        Self {
            default_model,
            models: HashMap::new(),
            delays: HashMap::new(),
            missing: HashSet::new(),
            failing: HashMap::new(),
            loads: Mutex::new(HashMap::new()),
            running: Mutex::new(HashMap::new()),
            peak_running: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_model(mut self, key: &str, model: ScriptedModel) -> Self {
        self.models.insert(key.to_string(), model);
        self
    }

    pub fn with_delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_string(), delay);
        self
    }

    /// `key` has no artifacts.
    pub fn with_missing(mut self, key: &str) -> Self {
        self.missing.insert(key.to_string());
        self
    }

    /// `key` has artifacts but fails to load.
    pub fn with_failing(mut self, key: &str, reason: &str) -> Self {
        self.failing.insert(key.to_string(), reason.to_string());
        self
    }

    /// Number of `load` calls made for `key`, including failed ones.
    pub fn load_count(&self, key: &str) -> usize {
        self.loads.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    /// Most `load` calls for `key` ever observed running at the same time.
    pub fn peak_concurrent_loads(&self, key: &str) -> usize {
        self.peak_running
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.lock().unwrap().values().sum()
    }
}

impl ModelProvisioner for StubProvisioner {
    fn load(&self, key: &str) -> Result<ModelHandle, ProvisionError> {
        *self.loads.lock().unwrap().entry(key.to_string()).or_default() += 1;

        if let Some(delay) = self.delays.get(key) {
            let running = {
                let mut running = self.running.lock().unwrap();
                let count = running.entry(key.to_string()).or_default();
                *count += 1;
                *count
            };
            let mut peak = self.peak_running.lock().unwrap();
            let entry = peak.entry(key.to_string()).or_default();
            *entry = (*entry).max(running);
            drop(peak);

            std::thread::sleep(*delay);
            *self.running.lock().unwrap().entry(key.to_string()).or_default() -= 1;
        }

        if self.missing.contains(key) {
            return Err(ProvisionError::NotFound {
                key: key.to_string(),
                path: self.artifact_path(key).display().to_string(),
            });
        }
        if let Some(reason) = self.failing.get(key) {
            return Err(ProvisionError::LoadFailure {
                key: key.to_string(),
                reason: reason.clone(),
            });
        }

        let model = self.models.get(key).unwrap_or(&self.default_model);
        Ok(ModelHandle::new(key, model.boxed()))
    }

    fn artifact_path(&self, key: &str) -> PathBuf {
        PathBuf::from("/stub/models").join(key)
    }
}
