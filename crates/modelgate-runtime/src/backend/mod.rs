//! Inference backends.
//!
//! A backend turns the artifacts in a model directory into a [`LoadedModel`]:
//! the opaque model+tokenizer pair that the cache owns and the executor drives.
//! Nothing outside this module looks inside a loaded model.

mod openai_compatible;

pub use openai_compatible::OpenAiCompatibleBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::InferenceError;
use crate::provision::ModelManifest;

/// Compute device a model is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
    Mps,
    /// Weights live in another process (e.g. a local completions server).
    Remote,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::Mps => "mps",
            Device::Remote => "remote",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda),
            "mps" | "metal" => Ok(Device::Mps),
            "remote" => Ok(Device::Remote),
            other => Err(format!("unknown device '{}'", other)),
        }
    }
}

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    /// 0.0 requests greedy decoding.
    pub temperature: f32,
    pub top_p: f32,
}

impl GenerationParams {
    pub fn is_greedy(&self) -> bool {
        self.temperature <= 0.0
    }
}

/// Newly generated continuation, without the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub output_tokens: u64,
}

/// A resident model ready to generate.
///
/// Implementations doing CPU/GPU-bound work must move it onto blocking
/// threads themselves; `generate` is polled on the request-serving runtime.
#[async_trait]
pub trait LoadedModel: Send + Sync {
    fn device(&self) -> Device;

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, InferenceError>;
}

/// Constructs [`LoadedModel`]s from on-disk artifacts.
///
/// `load` is called on a blocking thread and may take seconds.
pub trait InferenceBackend: Send + Sync {
    fn name(&self) -> &str;

    fn load(&self, dir: &Path, manifest: &ModelManifest) -> Result<Box<dyn LoadedModel>, String>;
}

/// Backends addressable by the `backend` field of a model manifest.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn InferenceBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every backend compiled into this build.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OpenAiCompatibleBackend::new()));
        registry
    }

    pub fn register(&mut self, backend: Arc<dyn InferenceBackend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn InferenceBackend>> {
        self.backends.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_parse() {
        assert_eq!("CUDA".parse::<Device>().unwrap(), Device::Cuda);
        assert_eq!("metal".parse::<Device>().unwrap(), Device::Mps);
        assert!("tpu".parse::<Device>().is_err());
        assert_eq!(Device::default().to_string(), "cpu");
    }

    #[test]
    fn test_builtin_registry() {
        let registry = BackendRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["openai-compatible"]);
        assert!(registry.get("openai-compatible").is_some());
        assert!(registry.get("llama-cpp").is_none());
    }

    #[test]
    fn test_greedy_params() {
        let params = GenerationParams {
            max_new_tokens: 8,
            temperature: 0.0,
            top_p: 1.0,
        };
        assert!(params.is_greedy());
    }
}
