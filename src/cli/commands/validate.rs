//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{experiment_name, load_config, validate_paths, RunSpec, ValidateArgs};
use crate::error::Result;

/// Format data configuration as a string
pub fn format_data_info(spec: &RunSpec) -> String {
    [
        format!("  Dataset: {} ({})", spec.data.dataset_name(), spec.data.path.display()),
        format!("  Batch size: {}", spec.data.batch_size),
    ]
    .join("\n")
}

/// Format model and loss configuration as a string
pub fn format_model_info(spec: &RunSpec) -> Result<String> {
    let loss = spec.loss.build()?;
    Ok([
        format!("  Hidden size: {}", spec.model.hidden_size),
        format!("  Edge weights: {}", if spec.model.use_edge_weights { "on" } else { "off" }),
        format!("  Loss: {loss}"),
    ]
    .join("\n"))
}

/// Format optimizer and schedule as a string
pub fn format_training_info(spec: &RunSpec) -> String {
    let t = &spec.training;
    let mut lines = vec![
        format!("  Optimizer: {} (lr={}, weight_decay={})", t.optimizer, t.lr, t.weight_decay),
        format!("  LR decay: x{} every {} epochs", t.lr_decay_factor, t.lr_decay_step_size),
        format!("  Epochs: {}", t.max_epochs),
        format!("  Gradient clip: {}", t.grad_clip_value),
        format!("  Seed: {}", t.seed),
    ];
    if let Some(dir) = &spec.output_dir {
        lines.push(format!("  Output dir: {}", dir.display()));
    }
    lines.join("\n")
}

/// Print detailed configuration summary
fn print_detailed_summary(spec: &RunSpec) -> Result<()> {
    println!();
    println!("Configuration Summary:");
    println!("  Experiment: {}", experiment_name(spec, "graph_conv")?);
    println!("{}", format_data_info(spec));
    println!();
    println!("{}", format_model_info(spec)?);
    println!();
    println!("{}", format_training_info(spec));
    Ok(())
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> std::result::Result<(), String> {
    log(level, LogLevel::Normal, &format!("Validating config: {}", args.config.display()));

    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    validate_paths(&spec).map_err(|e| format!("Validation failed: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");

    if args.detailed && level != LogLevel::Quiet {
        print_detailed_summary(&spec).map_err(|e| format!("Config error: {e}"))?;
    }

    Ok(())
}
