use owo_colors::Style;

use super::{header, paint};
use crate::handlers::models::ModelArtifact;

pub fn format_models(models: &[ModelArtifact]) -> String {
    let mut out = header(format!(
        "{:<11} {:<20} {:<18} {}",
        "OPERATION", "MODEL", "BACKEND", "ARTIFACTS"
    ));
    out.push('\n');

    for model in models {
        let status = match (&model.problem, model.present) {
            (None, true) => paint("ok", Style::new().green()),
            (Some(problem), true) => paint(problem, Style::new().yellow()),
            (_, false) => paint(
                format!("missing ({})", model.path.display()),
                Style::new().red(),
            ),
        };
        out.push_str(&format!(
            "{:<11} {:<20} {:<18} {}\n",
            model.operation.as_str(),
            model.model,
            model.backend.as_deref().unwrap_or("-"),
            status
        ));
    }
    out
}
