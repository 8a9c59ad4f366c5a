//! Scripted inference backend.
//!
//! A `ScriptedModel` replays queued outputs (or a fixed default) and records
//! every prompt it receives. Clones share state, so a test can keep one copy
//! for inspection while the cache owns another.

use async_trait::async_trait;
use modelgate_runtime::{
    Device, Generation, GenerationParams, InferenceBackend, InferenceError, LoadedModel,
    ModelManifest,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

#[derive(Debug)]
struct ScriptState {
    queue: Mutex<VecDeque<Reply>>,
    default_reply: Mutex<Reply>,
    tokens: Mutex<Option<u64>>,
    delay: Mutex<Duration>,
    prompts: Mutex<Vec<String>>,
    params: Mutex<Vec<GenerationParams>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct ScriptedModel {
    state: Arc<ScriptState>,
    device: Device,
}

impl ScriptedModel {
    /// Model that answers every prompt with `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            state: Arc::new(ScriptState {
                queue: Mutex::new(VecDeque::new()),
                default_reply: Mutex::new(Reply::Text(text.into())),
                tokens: Mutex::new(None),
                delay: Mutex::new(Duration::ZERO),
                prompts: Mutex::new(Vec::new()),
                params: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }),
            device: Device::Cpu,
        }
    }

    /// Model whose every generation fails.
    pub fn failing(reason: impl Into<String>) -> Self {
        let model = Self::new("");
        *model.state.default_reply.lock().unwrap() = Reply::Fail(reason.into());
        model
    }

    /// Report a fixed token count instead of the whitespace word count.
    pub fn with_tokens(self, tokens: u64) -> Self {
        *self.state.tokens.lock().unwrap() = Some(tokens);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock().unwrap() = delay;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Queue a one-shot output, used before the default.
    pub fn push_output(&self, text: impl Into<String>) {
        self.state
            .queue
            .lock()
            .unwrap()
            .push_back(Reply::Text(text.into()));
    }

    /// Queue a one-shot failure.
    pub fn push_failure(&self, reason: impl Into<String>) {
        self.state
            .queue
            .lock()
            .unwrap()
            .push_back(Reply::Fail(reason.into()));
    }

    pub fn calls(&self) -> usize {
        self.state.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }

    pub fn last_params(&self) -> Option<GenerationParams> {
        self.state.params.lock().unwrap().last().copied()
    }

    /// Highest number of generations observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn boxed(&self) -> Box<dyn LoadedModel> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl LoadedModel for ScriptedModel {
    fn device(&self) -> Device {
        self.device
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, InferenceError> {
        self.state.prompts.lock().unwrap().push(prompt.to_string());
        self.state.params.lock().unwrap().push(*params);

        let running = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.state.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self
            .state
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.state.default_reply.lock().unwrap().clone());

        match reply {
            Reply::Text(text) => {
                let output_tokens = self
                    .state
                    .tokens
                    .lock()
                    .unwrap()
                    .unwrap_or_else(|| text.split_whitespace().count() as u64);
                Ok(Generation {
                    text,
                    output_tokens,
                })
            }
            Reply::Fail(reason) => Err(InferenceError::Backend(reason)),
        }
    }
}

/// Backend registered as `scripted`; every model it loads shares one script.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    model: ScriptedModel,
}

impl ScriptedBackend {
    pub const NAME: &'static str = "scripted";

    pub fn new(model: ScriptedModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ScriptedModel {
        &self.model
    }
}

impl InferenceBackend for ScriptedBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn load(&self, _dir: &Path, manifest: &ModelManifest) -> Result<Box<dyn LoadedModel>, String> {
        let model = match manifest.device {
            Some(device) => self.model.clone().with_device(device),
            None => self.model.clone(),
        };
        Ok(model.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerationParams {
        GenerationParams {
            max_new_tokens: 16,
            temperature: 0.0,
            top_p: 1.0,
        }
    }

    #[tokio::test]
    async fn test_queue_then_default() {
        let model = ScriptedModel::new("default reply");
        model.push_output("first");
        model.push_failure("boom");

        let first = model.generate("a", &params()).await.unwrap();
        assert_eq!(first.text, "first");
        assert_eq!(first.output_tokens, 1);

        assert!(model.generate("b", &params()).await.is_err());

        let third = model.generate("c", &params()).await.unwrap();
        assert_eq!(third.text, "default reply");
        assert_eq!(model.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let model = ScriptedModel::new("x").with_tokens(7);
        let boxed = model.boxed();

        let generation = boxed.generate("prompt", &params()).await.unwrap();
        assert_eq!(generation.output_tokens, 7);
        assert_eq!(model.calls(), 1);
    }
}
