use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use modelgate_types::{
    ClassifyRequest, ClassifyResponse, Operation, OperationMeta, OperationRequest,
    SummarizeRequest, SummarizeResponse, TranslateRequest, TranslateResponse,
};

use crate::backend::Generation;
use crate::cache::ModelCache;
use crate::classify::{self, LabelOutcome};
use crate::config::OperationSpec;
use crate::executor::InferenceExecutor;
use crate::prompts;
use crate::quota::QuotaService;
use crate::{Error, Result};

/// End-to-end pipeline for every operation.
///
/// validate -> admit -> resolve -> render -> infer -> account -> assemble.
/// Validation and admission happen before any model work, so rejected
/// requests are cheap and never consume quota unless admitted.
#[derive(Clone)]
pub struct Orchestrator {
    operations: Arc<BTreeMap<Operation, OperationSpec>>,
    quota: QuotaService,
    cache: Arc<ModelCache>,
    executor: InferenceExecutor,
}

/// Output of the shared pipeline, before operation-specific assembly.
struct Completed<R> {
    request: R,
    model: String,
    generation: Generation,
    started: Instant,
}

impl<R: OperationRequest> Completed<R> {
    fn meta(&self) -> OperationMeta {
        OperationMeta {
            operation: R::OPERATION,
            model_used: self.model.clone(),
            input_chars: self.request.text().chars().count(),
            output_tokens: self.generation.output_tokens,
            execution_time_ms: round2(self.started.elapsed().as_secs_f64() * 1000.0),
            request_id: self.request.request_id().map(str::to_string),
            timestamp: Utc::now(),
        }
    }

    fn log(&self, meta: &OperationMeta) {
        tracing::info!(
            operation = %meta.operation,
            model = %meta.model_used,
            chars = meta.input_chars,
            tokens = meta.output_tokens,
            elapsed_ms = meta.execution_time_ms,
            request_id = meta.request_id.as_deref().unwrap_or("-"),
            "operation completed"
        );
    }
}

impl Orchestrator {
    pub fn new(
        operations: Arc<BTreeMap<Operation, OperationSpec>>,
        quota: QuotaService,
        cache: Arc<ModelCache>,
        executor: InferenceExecutor,
    ) -> Self {
        Self {
            operations,
            quota,
            cache,
            executor,
        }
    }

    pub async fn summarize(&self, request: SummarizeRequest) -> Result<SummarizeResponse> {
        let done = self.run(request, prompts::render_summarize).await?;

        let summary = done.generation.text.clone();
        let sentence_count = count_sentences(&summary);
        let meta = done.meta();
        done.log(&meta);

        Ok(SummarizeResponse {
            summary,
            sentence_count,
            meta,
        })
    }

    pub async fn translate(&self, request: TranslateRequest) -> Result<TranslateResponse> {
        let done = self.run(request, prompts::render_translate).await?;

        let meta = done.meta();
        done.log(&meta);

        Ok(TranslateResponse {
            translated_text: done.generation.text,
            source_language: done.request.source_language,
            target_language: done.request.target_language,
            meta,
        })
    }

    pub async fn classify(&self, request: ClassifyRequest) -> Result<ClassifyResponse> {
        let done = self.run(request, prompts::render_classify).await?;

        let categories = &done.request.categories;
        let outcome = classify::parse_label(&done.generation.text, categories);
        if let LabelOutcome::Fallback { label, reason } = &outcome {
            tracing::warn!(
                fallback = %label,
                reason = %reason,
                raw = %done.generation.text.chars().take(200).collect::<String>(),
                "classifier output unusable, using first category"
            );
        }

        let label = outcome.label().to_string();
        let confidence = outcome.confidence();
        let scores = classify::score_distribution(categories, &label, confidence);
        let meta = done.meta();
        done.log(&meta);

        Ok(ClassifyResponse {
            label,
            confidence,
            scores,
            meta,
        })
    }

    async fn run<R, F>(&self, request: R, render: F) -> Result<Completed<R>>
    where
        R: OperationRequest,
        F: FnOnce(&R) -> String,
    {
        let started = Instant::now();
        let operation = R::OPERATION;

        // 1. validate
        let spec = self.operations.get(&operation).ok_or_else(|| {
            Error::Configuration(format!("operation '{}' has no configured model", operation))
        })?;
        let request = request.normalize()?;
        let length = request.text().chars().count();
        if length > spec.max_input_chars {
            tracing::info!(%operation, length, limit = spec.max_input_chars, "input too large");
            return Err(Error::InputTooLarge {
                operation,
                length,
                limit: spec.max_input_chars,
            });
        }

        // 2. admit; the day is fixed here so accounting hits the same record
        let day = self.quota.clock().today();
        self.quota.admit_on(operation, day).await?;

        // 3. resolve
        let handle = self
            .cache
            .resolve(&spec.model)
            .await
            .map_err(|err| Error::provision(operation, err))?;

        // 4. render
        let prompt = render(&request);

        // 5. infer
        let params = self.executor.params(spec.max_output_tokens);
        let generation = self
            .executor
            .generate(&handle, &prompt, &params)
            .await
            .map_err(|err| {
                tracing::error!(%operation, model = %spec.model, error = %err, "inference failed");
                Error::inference(operation, err)
            })?;

        // 6. account
        if let Err(err) = self
            .quota
            .record_tokens_on(operation, day, generation.output_tokens)
            .await
        {
            tracing::warn!(%operation, tokens = generation.output_tokens, error = %err, "token accounting failed");
        }

        Ok(Completed {
            request,
            model: spec.model.clone(),
            generation,
            started,
        })
    }
}

/// Non-empty fragments between sentence terminators.
pub fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|fragment| !fragment.trim().is_empty())
        .count()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
