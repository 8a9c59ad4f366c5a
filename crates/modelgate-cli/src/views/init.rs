use owo_colors::Style;

use super::{header, paint};
use crate::handlers::init::InitReport;

pub fn print_init(report: &InitReport) {
    println!("{}\n", header("modelgate init"));

    let config_state = if report.config_created {
        "written"
    } else {
        "kept existing"
    };
    println!(
        "{} Config {}: {}",
        paint("✓", Style::new().green()),
        config_state,
        report.config_path.display()
    );
    println!(
        "{} Models directory: {}",
        paint("✓", Style::new().green()),
        report.models_dir.display()
    );
    println!(
        "{} Ledger: {} ({} limit row(s) seeded)",
        paint("✓", Style::new().green()),
        report.ledger.display(),
        report.seeded_limits
    );

    println!("\nOperations:");
    for (operation, model) in &report.operations {
        println!("  {:<10} -> {}", operation.as_str(), model);
    }

    println!("\nNext steps:");
    println!(
        "  Place one directory per model under {} with a model.toml manifest",
        report.models_dir.display()
    );
    println!("  modelgate models      # check artifacts");
    println!("  modelgate serve       # start the gateway");
}
