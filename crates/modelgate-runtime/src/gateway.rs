use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use modelgate_ledger::Database;
use modelgate_types::{
    HealthResponse, HealthStatus, ModelStatus, Operation, OperationSettings, SettingsResponse,
};
use sysinfo::System;

use crate::backend::BackendRegistry;
use crate::cache::{ModelCache, ResourceProbe};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, OperationSpec};
use crate::executor::InferenceExecutor;
use crate::orchestrator::Orchestrator;
use crate::provision::{FsProvisioner, ModelProvisioner};
use crate::quota::QuotaService;
use crate::{Error, Result};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Process-wide context, built once at startup and shared by reference.
pub struct Gateway {
    config: Arc<Config>,
    quota: QuotaService,
    cache: Arc<ModelCache>,
    orchestrator: Orchestrator,
    system: Mutex<System>,
    started_at: Instant,
}

/// Assembles a [`Gateway`], with optional replacements for the provisioner,
/// clock and ledger.
pub struct GatewayBuilder {
    config: Config,
    provisioner: Option<Arc<dyn ModelProvisioner>>,
    clock: Option<Arc<dyn Clock>>,
    ledger: Option<Database>,
}

impl GatewayBuilder {
    pub fn provisioner(mut self, provisioner: Arc<dyn ModelProvisioner>) -> Self {
        self.provisioner = Some(provisioner);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn ledger(mut self, ledger: Database) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Open the ledger (unless given), seed default limits and wire components.
    pub async fn build(self) -> Result<Gateway> {
        let config = self.config;
        config.validate()?;

        let ledger = match self.ledger {
            Some(ledger) => ledger,
            None => {
                let path = config.paths.ledger.clone();
                tokio::task::spawn_blocking(move || Database::open(&path)).await??
            }
        };

        let provisioner = self.provisioner.unwrap_or_else(|| {
            Arc::new(FsProvisioner::new(
                config.paths.models_dir.clone(),
                BackendRegistry::with_builtin(),
            ))
        });
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let operations: Arc<BTreeMap<Operation, OperationSpec>> =
            Arc::new(config.operations.clone());
        let quota = QuotaService::new(ledger, clock, config.operations.clone(), &config.quota);
        quota.seed_limits().await?;

        let cache = Arc::new(ModelCache::new(
            provisioner,
            config.inference.provision_timeout(),
        ));
        let executor = InferenceExecutor::new(&config.inference);
        let orchestrator = Orchestrator::new(
            operations,
            quota.clone(),
            Arc::clone(&cache),
            executor,
        );

        tracing::debug!(
            operations = config.operations.len(),
            max_concurrent = config.inference.max_concurrent,
            "gateway ready"
        );

        Ok(Gateway {
            config: Arc::new(config),
            quota,
            cache,
            orchestrator,
            system: Mutex::new(System::new()),
            started_at: Instant::now(),
        })
    }
}

impl Gateway {
    pub fn builder(config: Config) -> GatewayBuilder {
        GatewayBuilder {
            config,
            provisioner: None,
            clock: None,
            ledger: None,
        }
    }

    pub async fn open(config: Config) -> Result<Self> {
        Self::builder(config).build().await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn quota(&self) -> &QuotaService {
        &self.quota
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Provision every configured model. Returns how many are resident.
    pub async fn preload(&self) -> usize {
        let keys: Vec<&str> = self
            .config
            .operations
            .values()
            .map(|spec| spec.model.as_str())
            .collect();
        let resident = self.cache.warm(keys.iter().copied()).await;
        tracing::info!(resident, configured = keys.len(), "model preload finished");
        resident
    }

    /// Evict a model by identifier. Unknown identifiers are a caller error.
    pub fn evict(&self, model: &str) -> Result<bool> {
        if !self.config.operations.values().any(|spec| spec.model == model) {
            return Err(Error::InvalidInput(format!(
                "model '{}' is not configured for any operation",
                model
            )));
        }
        Ok(self.cache.evict(model))
    }

    pub fn model_statuses(&self) -> Vec<ModelStatus> {
        self.config
            .operations
            .iter()
            .map(|(operation, spec)| {
                let handle = self.cache.handle(&spec.model);
                ModelStatus {
                    operation: *operation,
                    model: spec.model.clone(),
                    loaded: handle.is_some(),
                    path: self.cache.artifact_path(&spec.model).display().to_string(),
                    device: handle.as_ref().map(|h| h.device().to_string()),
                    loaded_at: handle.as_ref().map(|h| h.loaded_at()),
                }
            })
            .collect()
    }

    /// Healthy when every configured model is resident.
    pub fn health(&self) -> HealthResponse {
        let models = self.model_statuses();
        let status = if models.iter().all(|m| self.cache.is_resident(&m.model)) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        let (memory_used_mb, memory_total_mb, cpu_percent) = {
            let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
            system.refresh_memory();
            system.refresh_cpu_usage();
            (
                system.used_memory() as f64 / BYTES_PER_MB,
                system.total_memory() as f64 / BYTES_PER_MB,
                system.global_cpu_usage(),
            )
        };

        HealthResponse {
            status,
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
            memory_used_mb: (memory_used_mb * 10.0).round() / 10.0,
            memory_total_mb: (memory_total_mb * 10.0).round() / 10.0,
            cpu_percent,
            models,
            timestamp: Utc::now(),
        }
    }

    pub fn settings(&self) -> SettingsResponse {
        SettingsResponse {
            app_name: "modelgate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            default_daily_limit: self.config.quota.default_daily_limit,
            max_daily_limit: self.config.quota.max_daily_limit,
            temperature: self.config.inference.temperature,
            top_p: self.config.inference.top_p,
            operations: self
                .config
                .operations
                .iter()
                .map(|(operation, spec)| OperationSettings {
                    operation: *operation,
                    model: spec.model.clone(),
                    max_input_chars: spec.max_input_chars,
                    max_output_tokens: spec.max_output_tokens,
                })
                .collect(),
        }
    }
}
