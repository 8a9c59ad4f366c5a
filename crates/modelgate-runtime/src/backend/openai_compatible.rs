use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

use super::{Device, Generation, GenerationParams, InferenceBackend, LoadedModel};
use crate::InferenceError;
use crate::provision::ModelManifest;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

/// Backend for a locally hosted server speaking the OpenAI completions API
/// (llama.cpp `server`, vLLM, blazr, ...).
#[derive(Debug, Default)]
pub struct OpenAiCompatibleBackend;

impl OpenAiCompatibleBackend {
    pub fn new() -> Self {
        Self
    }
}

impl InferenceBackend for OpenAiCompatibleBackend {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn load(&self, dir: &Path, manifest: &ModelManifest) -> Result<Box<dyn LoadedModel>, String> {
        let endpoint = manifest
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/')
            .to_string();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(format!("endpoint '{}' is not an http(s) URL", endpoint));
        }

        // Served model name defaults to the directory name.
        let model = manifest.model.clone().unwrap_or_else(|| {
            dir.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;

        Ok(Box::new(CompletionsModel {
            client,
            url: format!("{}/v1/completions", endpoint),
            model,
            device: manifest.device.unwrap_or(Device::Remote),
        }))
    }
}

struct CompletionsModel {
    client: reqwest::Client,
    url: String,
    model: String,
    device: Device,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct CompletionUsage {
    completion_tokens: Option<u64>,
}

#[async_trait]
impl LoadedModel for CompletionsModel {
    fn device(&self) -> Device {
        self.device
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, InferenceError> {
        let started = Instant::now();
        let body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: params.max_new_tokens,
            temperature: if params.is_greedy() { 0.0 } else { params.temperature },
            top_p: params.top_p,
            stream: false,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Backend(format!("request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(InferenceError::Backend(format!(
                "{} returned {}: {}",
                self.url,
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Backend(format!("invalid completion payload: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| InferenceError::Backend("completion has no choices".to_string()))?;

        let output_tokens = parsed
            .usage
            .and_then(|usage| usage.completion_tokens)
            .unwrap_or_else(|| estimate_tokens(&text));

        tracing::debug!(
            model = %self.model,
            tokens = output_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "completion received"
        );

        Ok(Generation {
            text,
            output_tokens,
        })
    }
}

/// Whitespace word count, used when the server reports no usage block.
fn estimate_tokens(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}
