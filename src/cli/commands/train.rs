//! Train command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_config, run_experiment, validate_config, validate_paths, TrainArgs};

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("pertgnn: training from {}", args.config.display()));

    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    apply_overrides(&mut spec, &args);
    validate_config(&spec).map_err(|e| format!("Invalid overrides: {e}"))?;

    if args.dry_run {
        validate_paths(&spec).map_err(|e| format!("Config error: {e}"))?;
        log(level, LogLevel::Normal, "Dry run - config validated successfully");
        log(level, LogLevel::Verbose, &format!("  Dataset: {}", spec.data.path.display()));
        log(
            level,
            LogLevel::Verbose,
            &format!("  Optimizer: {} (lr={})", spec.training.optimizer, spec.training.lr),
        );
        log(level, LogLevel::Verbose, &format!("  Epochs: {}", spec.training.max_epochs));
        return Ok(());
    }

    let report = run_experiment(&spec).map_err(|e| format!("Training error: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Training complete: {} (best epoch {}, val MSE {:.4}, test DE MSE {:.4})",
            report.name, report.best_epoch, report.min_val, report.test.mse_de
        ),
    );
    if let Some(dir) = &report.output_dir {
        log(level, LogLevel::Verbose, &format!("  Artifacts: {}", dir.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args(config: &std::path::Path) -> TrainArgs {
        TrainArgs {
            config: config.to_path_buf(),
            output_dir: None,
            epochs: None,
            batch_size: None,
            lr: None,
            seed: None,
            dry_run: true,
        }
    }

    #[test]
    fn test_dry_run_reports_missing_dataset() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "data:\n  path: /nonexistent/pertgnn/data.json").unwrap();
        let err = run_train(args(file.path()), LogLevel::Quiet).unwrap_err();
        assert!(err.contains("Dataset file does not exist"));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "data:\n  path: data.json").unwrap();
        let args = TrainArgs { lr: Some(5.0), ..args(file.path()) };
        let err = run_train(args, LogLevel::Quiet).unwrap_err();
        assert!(err.starts_with("Invalid overrides"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = run_train(args(std::path::Path::new("/nonexistent/run.yaml")), LogLevel::Quiet).unwrap_err();
        assert!(err.starts_with("Config error"));
    }
}
