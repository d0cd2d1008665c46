//! Info command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{experiment_name, load_config, InfoArgs, OutputFormat};

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            let name = experiment_name(&spec, "graph_conv").map_err(|e| format!("Config error: {e}"))?;
            log(level, LogLevel::Normal, "Configuration Info:");
            println!();
            println!("Experiment: {name}");
            println!("Dataset: {}", spec.data.path.display());
            println!("Optimizer: {} (lr={})", spec.training.optimizer, spec.training.lr);
            println!("Epochs: {}", spec.training.max_epochs);
            println!("Batch size: {}", spec.data.batch_size);
            println!("Loss: {} / {}", spec.loss.loss_type, spec.loss.loss_mode);
        }
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&spec).map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&spec).map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
