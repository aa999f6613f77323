use crate::BatchSummary;
use crate::catalog::resolve_url;
use crate::input::JobConfig;
use crate::output::artifact_dir;
use std::time::Duration;

pub fn show_greeting(config_path: &str) {
    println!("=== SubX Field Fetcher ===");
    println!("Loading configuration from: {}", config_path);
}

pub fn config_echo(config: &JobConfig) {
    println!("\nConfiguration:");
    println!("  Output path: {}", config.out_path.display());
    println!("  Catalog: {} ({})", config.base_url, config.forecast_type);
    println!("  Number of models: {}", config.models.len());

    for (i, model) in config.models.iter().enumerate() {
        println!("    Model {}: {}-{}", i + 1, model.group, model.model);
    }

    println!("  Number of fields: {}", config.fields.len());
    for (i, field) in config.fields.iter().enumerate() {
        println!("    Field {}: {} @ {}", i + 1, field.variable, field.plev);
    }
}

/// Lists the remote resource and the output directory of every (model, field) pair.
pub fn show_plan(config: &JobConfig) {
    println!("\nPlan:");
    for model in &config.models {
        for field in &config.fields {
            let url = resolve_url(
                &config.base_url,
                &config.forecast_type,
                &model.group,
                &model.model,
                &field.variable,
            );
            let dir = artifact_dir(&config.out_path, &field.variable, &field.plev, &model.group, &model.model);
            println!("  {}", url);
            println!("    -> {}", dir.display());
        }
    }
}

pub fn show_summary(summary: &BatchSummary) {
    let verb = if summary.dry_run { "planned" } else { "written" };
    println!("\nRun Summary:");
    println!("  Variables processed: {}", summary.variables_processed);
    println!("  Files {}: {}", verb, summary.artifacts.len());
    println!("  Failures: {}", summary.failures.len());

    for failure in &summary.failures {
        let member = failure
            .ensemble
            .map(|e| format!(" e{}", e))
            .unwrap_or_default();
        let date = failure
            .start_date
            .as_deref()
            .map(|d| format!(" {}", d))
            .unwrap_or_default();
        println!(
            "    {}-{} {} ({}){}{}: {}",
            failure.group, failure.model, failure.variable, failure.plev, member, date, failure.error
        );
    }
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!("\n=== Fetch completed in {:.2?} ===", elapsed);
}
