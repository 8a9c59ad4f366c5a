use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::views;
use anyhow::Result;
use modelgate_runtime::{BackendRegistry, Config, ModelManifest};
use modelgate_types::Operation;
use serde::Serialize;
use std::path::PathBuf;

/// On-disk state of one configured model, checked without loading it.
#[derive(Debug, Serialize)]
pub struct ModelArtifact {
    pub operation: Operation,
    pub model: String,
    pub path: PathBuf,
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

pub fn inspect(config: &Config, registry: &BackendRegistry) -> Vec<ModelArtifact> {
    config
        .operations
        .iter()
        .map(|(operation, spec)| {
            let path = config.model_dir(&spec.model);
            let present = path.is_dir();
            let (backend, problem) = if present {
                match ModelManifest::read(&path) {
                    Ok(manifest) if registry.get(&manifest.backend).is_some() => {
                        (Some(manifest.backend), None)
                    }
                    Ok(manifest) => {
                        let problem = format!("unknown backend '{}'", manifest.backend);
                        (Some(manifest.backend), Some(problem))
                    }
                    Err(reason) => (None, Some(reason)),
                }
            } else {
                (None, None)
            };

            ModelArtifact {
                operation: *operation,
                model: spec.model.clone(),
                path,
                present,
                backend,
                problem,
            }
        })
        .collect()
}

pub fn handle(ctx: &ExecutionContext) -> Result<()> {
    let artifacts = inspect(ctx.config()?, &BackendRegistry::with_builtin());

    match ctx.format {
        OutputFormat::Json => views::print_json(&artifacts)?,
        OutputFormat::Plain => print!("{}", views::format_models(&artifacts)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inspect_reports_each_state() {
        let temp = TempDir::new().unwrap();
        let config = Config::default().resolved(temp.path());

        let summarize = config.model_dir("qwen-summarize");
        std::fs::create_dir_all(&summarize).unwrap();
        std::fs::write(summarize.join("model.toml"), "backend = \"openai-compatible\"\n").unwrap();

        let translate = config.model_dir("qwen-translate");
        std::fs::create_dir_all(&translate).unwrap();
        std::fs::write(translate.join("model.toml"), "backend = \"onnx\"\n").unwrap();

        let artifacts = inspect(&config, &BackendRegistry::with_builtin());
        let by_op = |op: Operation| artifacts.iter().find(|a| a.operation == op).unwrap();

        let ok = by_op(Operation::Summarize);
        assert!(ok.present);
        assert_eq!(ok.backend.as_deref(), Some("openai-compatible"));
        assert!(ok.problem.is_none());

        let unknown = by_op(Operation::Translate);
        assert!(unknown.problem.as_deref().unwrap().contains("onnx"));

        let missing = by_op(Operation::Classify);
        assert!(!missing.present);
        assert!(missing.backend.is_none());
    }
}
