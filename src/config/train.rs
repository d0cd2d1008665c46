//! Run a full experiment from a YAML configuration

use super::schema::RunSpec;
use super::validate::{validate_config, validate_paths};
use crate::data::PertDataset;
use crate::error::Result;
use crate::eval::{compute_metrics, evaluate, Metrics, PerturbationMetrics};
use crate::model::{GraphConvConfig, GraphConvModel, ModelState, PerturbationModel};
use crate::train::{EpochRecord, JsonLinesSink, LossMode, ProgressSink, Trainer};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Files written to the output directory
pub const BEST_MODEL_FILE: &str = "best_model.json";
pub const TEST_METRICS_FILE: &str = "test_metrics.json";
pub const HISTORY_FILE: &str = "history.json";
pub const METRICS_LOG_FILE: &str = "metrics.jsonl";
pub const RUN_SPEC_FILE: &str = "run_spec.yaml";

/// Outcome of [`run_experiment`]
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub name: String,
    pub best_epoch: usize,
    /// Validation MSE of the selected model
    pub min_val: f32,
    /// Aggregate metrics of the selected model on the test split
    pub test: Metrics,
    pub test_per_perturbation: Vec<PerturbationMetrics>,
    pub history: Vec<EpochRecord>,
    /// Directory holding the saved artifacts, if any
    pub output_dir: Option<PathBuf>,
}

/// Load and validate a run specification
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<RunSpec> {
    let yaml_content = fs::read_to_string(config_path.as_ref())?;
    let spec: RunSpec = serde_yaml::from_str(&yaml_content)?;
    validate_config(&spec)?;
    Ok(spec)
}

/// `{model}_{hidden}_{loss_mode}_{dataset}`, with `_gamma{g}` for `l3`
pub fn experiment_name(spec: &RunSpec, model_name: &str) -> Result<String> {
    let loss = spec.loss.build()?;
    let mut name = format!(
        "{}_{}_{}_{}",
        model_name,
        spec.model.hidden_size,
        loss.mode().as_str(),
        spec.data.dataset_name()
    );
    if let LossMode::L3 { gamma } = loss.mode() {
        name.push_str(&format!("_gamma{gamma}"));
    }
    Ok(name)
}

/// Train, select and test a model as described by `spec`
///
/// The model is seeded from `training.seed`, which also fixes the order of
/// the training batches. The best model is evaluated on the test split; with
/// an `output_dir`, its parameters, the test metrics, the epoch history, a
/// JSON-lines metrics log and the resolved spec are written there.
pub fn run_experiment(spec: &RunSpec) -> Result<ExperimentReport> {
    validate_config(spec)?;
    validate_paths(spec)?;
    let loss = spec.loss.build()?;

    let dataset = PertDataset::load(&spec.data.path)?;
    let loaders = dataset.loaders(spec.data.batch_size, spec.training.seed)?;
    let gene_idx = dataset.de_gene_idx();

    let mut model = GraphConvModel::new(
        GraphConvConfig {
            num_node_features: dataset.num_node_features(),
            hidden_size: spec.model.hidden_size,
            use_edge_weights: spec.model.use_edge_weights,
        },
        spec.training.seed,
    )?;
    let name = experiment_name(spec, model.name())?;

    log::info!(
        "Experiment {name}: {} genes, {} train / {} val / {} test batches, {} parameters",
        dataset.num_genes(),
        loaders.train.len(),
        loaders.val.len(),
        loaders.test.len(),
        model.num_parameters()
    );

    let mut trainer = Trainer::new(spec.training.clone(), loss)?;
    trainer.add_sink(ProgressSink::new(spec.training.max_epochs));
    if let Some(dir) = &spec.output_dir {
        fs::create_dir_all(dir)?;
        trainer.add_sink(JsonLinesSink::create(dir.join(METRICS_LOG_FILE))?);
    }

    let outcome = trainer.train(
        &mut model,
        &loaders.train,
        &loaders.val,
        dataset.graph(),
        dataset.edge_weights(),
        gene_idx,
    )?;

    let mut best = outcome.best;
    let record = evaluate(&loaders.test, dataset.graph(), dataset.edge_weights(), &mut best, gene_idx)?;
    let (test, test_per_perturbation) = compute_metrics(&record, gene_idx)?;
    log::info!("Final best performing model: Test_DE: {:.4}, R2 {:.4}", test.mse_de, test.r2_de);

    let report = ExperimentReport {
        name,
        best_epoch: outcome.best_epoch,
        min_val: outcome.min_val,
        test,
        test_per_perturbation,
        history: outcome.history,
        output_dir: spec.output_dir.clone(),
    };

    if let Some(dir) = &spec.output_dir {
        save_artifacts(dir, spec, &best, &report)?;
        log::info!("Saved best model and metrics to {}", dir.display());
    }

    Ok(report)
}

#[derive(Serialize)]
struct TestMetricsFile<'a> {
    experiment: &'a str,
    best_epoch: usize,
    metrics: &'a Metrics,
    per_perturbation: &'a [PerturbationMetrics],
}

fn save_artifacts<M: PerturbationModel>(dir: &Path, spec: &RunSpec, best: &M, report: &ExperimentReport) -> Result<()> {
    ModelState::from_model(best).save(dir.join(BEST_MODEL_FILE))?;

    let test = TestMetricsFile {
        experiment: &report.name,
        best_epoch: report.best_epoch,
        metrics: &report.test,
        per_perturbation: &report.test_per_perturbation,
    };
    fs::write(dir.join(TEST_METRICS_FILE), serde_json::to_string_pretty(&test)?)?;
    fs::write(dir.join(HISTORY_FILE), serde_json::to_string_pretty(&report.history)?)?;
    fs::write(dir.join(RUN_SPEC_FILE), serde_yaml::to_string(spec)?)?;
    Ok(())
}
