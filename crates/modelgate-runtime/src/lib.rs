pub mod backend;
pub mod cache;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod orchestrator;
pub mod prompts;
pub mod provision;
pub mod quota;

pub use backend::{
    BackendRegistry, Device, Generation, GenerationParams, InferenceBackend, LoadedModel,
    OpenAiCompatibleBackend,
};
pub use cache::{ModelCache, ResourceProbe};
pub use classify::LabelOutcome;
pub use clock::{Clock, SystemClock};
pub use config::{Config, OperationSpec, resolve_data_dir};
pub use error::{Error, InferenceError, OrchestrationCause, ProvisionError, Result};
pub use executor::InferenceExecutor;
pub use gateway::{Gateway, GatewayBuilder};
pub use orchestrator::Orchestrator;
pub use provision::{FsProvisioner, ModelHandle, ModelManifest, ModelProvisioner};
pub use quota::QuotaService;
