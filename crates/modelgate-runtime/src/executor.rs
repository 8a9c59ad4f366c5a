use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::InferenceError;
use crate::backend::{Generation, GenerationParams};
use crate::config::InferenceConfig;
use crate::provision::ModelHandle;

/// Runs generations on resident models through a bounded pool.
///
/// At most `max_concurrent` generations run at once; further callers wait
/// for a permit without blocking the runtime. Each call is bounded by
/// `timeout`, which includes the wait for a permit.
#[derive(Debug, Clone)]
pub struct InferenceExecutor {
    permits: Arc<Semaphore>,
    timeout: Duration,
    temperature: f32,
    top_p: f32,
}

impl InferenceExecutor {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            timeout: config.timeout(),
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }

    /// Sampling parameters from configuration with the given output cap.
    pub fn params(&self, max_new_tokens: u32) -> GenerationParams {
        GenerationParams {
            max_new_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }

    /// Generate a continuation of `prompt`; the returned text is trimmed.
    pub async fn generate(
        &self,
        handle: &ModelHandle,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, InferenceError> {
        let started = Instant::now();

        let run = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| InferenceError::WorkerUnavailable)?;
            handle.model().generate(prompt, params).await
        };

        let generation = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| InferenceError::Timeout(self.timeout))??;

        let text = generation.text.trim().to_string();
        tracing::debug!(
            model = handle.key(),
            tokens = generation.output_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation finished"
        );

        Ok(Generation {
            text,
            output_tokens: generation.output_tokens,
        })
    }
}
