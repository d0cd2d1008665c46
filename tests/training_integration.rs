//! End-to-end training through the public API
//!
//! A small JSON dataset is written to a temp dir, loaded, trained on and
//! evaluated the same way the `train` command does it.

use pertgnn::config::{load_config, run_experiment};
use pertgnn::data::{PertDataset, Split};
use pertgnn::eval::{compute_metrics, evaluate};
use pertgnn::model::{GraphConvConfig, GraphConvModel, ModelState, PerturbationModel};
use pertgnn::train::{MemorySink, PerturbationLoss, TrainConfig, Trainer};
use pertgnn::Error;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const GENES: usize = 4;

/// Three perturbations over a 4-gene ring; targets sit well above the
/// initial model output so training has something to fit
fn dataset_json() -> serde_json::Value {
    let perts = ["ctrl", "KLF1", "CEBPA"];
    let mut cells = Vec::new();
    for i in 0..30 {
        let split = match i % 5 {
            0..=2 => "train",
            3 => "val",
            _ => "test",
        };
        let p = i % 3;
        let x: Vec<Vec<f32>> =
            (0..GENES).map(|g| vec![if g == p { 1.0 } else { 0.0 }, 0.1 * g as f32]).collect();
        let y: Vec<f32> = (0..GENES).map(|g| 2.0 + 0.25 * g as f32 + if g == p { 0.5 } else { 0.0 }).collect();
        cells.push(json!({ "pert": perts[p], "split": split, "x": x, "y": y }));
    }
    json!({
        "genes": ["G0", "G1", "G2", "G3"],
        "edges": [[0, 1, 1.0], [1, 2, 0.5], [2, 3, 1.0], [3, 0, 0.5]],
        "node_features": 2,
        "de_genes": ["G0", "G2"],
        "cells": cells
    })
}

fn write_dataset(dir: &Path) -> PathBuf {
    let path = dir.join("ring.json");
    std::fs::write(&path, dataset_json().to_string()).unwrap();
    path
}

fn model(dataset: &PertDataset, seed: u64) -> GraphConvModel {
    GraphConvModel::new(
        GraphConvConfig { num_node_features: dataset.num_node_features(), hidden_size: 8, use_edge_weights: true },
        seed,
    )
    .unwrap()
}

#[test]
fn test_training_reduces_validation_error() {
    let dir = TempDir::new().unwrap();
    let dataset = PertDataset::load(write_dataset(dir.path())).unwrap();
    let loaders = dataset.loaders(4, 1).unwrap();
    let mut model = model(&dataset, 1);

    let config = TrainConfig::new().with_max_epochs(15).with_lr(0.02).with_lr_decay(1, 1.0);
    let mut trainer = Trainer::new(config, PerturbationLoss::micro_l2()).unwrap();
    let memory = MemorySink::new();
    trainer.add_sink(memory.clone());

    let outcome = trainer
        .train(
            &mut model,
            &loaders.train,
            &loaders.val,
            dataset.graph(),
            dataset.edge_weights(),
            dataset.de_gene_idx(),
        )
        .unwrap();

    assert_eq!(outcome.epochs(), 15);
    assert!(outcome.min_val < outcome.history[0].val.mse);

    // min_val tracked per epoch never increases
    let mut running = f32::INFINITY;
    for record in &outcome.history {
        let next = running.min(record.val.mse);
        assert!(next <= running);
        running = next;
    }
    assert_eq!(running, outcome.min_val);

    assert_eq!(memory.series("val_mse").len(), 15);
    assert_eq!(memory.summary().unwrap().best_epoch, outcome.best_epoch);
}

#[test]
fn test_best_snapshot_is_isolated_from_live_model() {
    let dir = TempDir::new().unwrap();
    let dataset = PertDataset::load(write_dataset(dir.path())).unwrap();
    let loaders = dataset.loaders(5, 3).unwrap();
    let mut model = model(&dataset, 3);

    let mut trainer = Trainer::new(TrainConfig::new().with_max_epochs(4), PerturbationLoss::micro_l2()).unwrap();
    let mut outcome = trainer
        .train(&mut model, &loaders.train, &loaders.val, dataset.graph(), dataset.edge_weights(), None)
        .unwrap();

    let saved = ModelState::from_model(&outcome.best);

    // Keep training the live model; the snapshot must not move
    trainer.train_epoch(&mut model, &loaders.train, dataset.graph(), dataset.edge_weights()).unwrap();
    assert_eq!(ModelState::from_model(&outcome.best), saved);

    let record = evaluate(&loaders.val, dataset.graph(), dataset.edge_weights(), &mut outcome.best, None).unwrap();
    let (metrics, _) = compute_metrics(&record, None).unwrap();
    assert!((metrics.mse - outcome.min_val).abs() < 1e-6);
}

#[test]
fn test_gradients_stay_within_clip_bound() {
    let dir = TempDir::new().unwrap();
    let dataset = PertDataset::load(write_dataset(dir.path())).unwrap();
    let batches = dataset.batches(Split::Train, 6, Some(2)).unwrap();
    let mut model = model(&dataset, 2);

    let config = TrainConfig::new().with_lr(0.05).with_grad_clip_value(0.01);
    let loss = PerturbationLoss::from_flags("l3", 2.0, "micro", 1.0).unwrap();
    let mut trainer = Trainer::new(config, loss).unwrap();

    for batch in &batches {
        trainer.train_step(&mut model, batch, dataset.graph(), dataset.edge_weights()).unwrap();
        for grad in model.parameters().iter().filter_map(|p| p.grad()) {
            assert!(grad.iter().all(|g| g.abs() <= 0.01));
        }
    }
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let dir = TempDir::new().unwrap();
    let dataset = PertDataset::load(write_dataset(dir.path())).unwrap();

    let run = || {
        let loaders = dataset.loaders(4, 9).unwrap();
        let mut model = model(&dataset, 9);
        let mut trainer = Trainer::new(TrainConfig::new().with_max_epochs(3), PerturbationLoss::micro_l2()).unwrap();
        trainer
            .train(&mut model, &loaders.train, &loaders.val, dataset.graph(), dataset.edge_weights(), None)
            .unwrap()
    };

    let a = run();
    let b = run();
    assert_eq!(a.history, b.history);
    assert_eq!(ModelState::from_model(&a.best), ModelState::from_model(&b.best));
}

#[test]
fn test_run_experiment_from_yaml() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(dir.path());
    let out = dir.path().join("out");
    let config = dir.path().join("run.yaml");
    std::fs::write(
        &config,
        format!(
            "data:\n  path: {}\n  batch_size: 4\nmodel:\n  hidden_size: 8\n  use_edge_weights: true\nloss:\n  loss_mode: l3\n  focal_gamma: 2\ntraining:\n  max_epochs: 3\noutput_dir: {}\n",
            data.display(),
            out.display()
        ),
    )
    .unwrap();

    let spec = load_config(&config).unwrap();
    let report = run_experiment(&spec).unwrap();

    assert_eq!(report.name, "graph_conv_8_l3_ring_gamma2");
    assert!(report.test.mse.is_finite());
    for file in ["best_model.json", "test_metrics.json", "history.json", "metrics.jsonl", "run_spec.yaml"] {
        assert!(out.join(file).is_file(), "missing {file}");
    }

    // The saved parameters load back into a fresh model of the same shape
    let dataset = PertDataset::load(&data).unwrap();
    let mut fresh = model(&dataset, 100);
    ModelState::load(out.join("best_model.json")).unwrap().apply_to(&mut fresh).unwrap();
}

#[test]
fn test_weighted_l3_is_a_configuration_error() {
    let result = PerturbationLoss::from_flags("l3", 2.0, "weighted", 1.0);
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn test_invalid_clip_value_is_rejected_before_training() {
    for clip in [-1.0, f32::NAN] {
        let config = TrainConfig::new().with_grad_clip_value(clip);
        let result = Trainer::new(config, PerturbationLoss::micro_l2());
        assert!(matches!(result, Err(Error::Configuration(_))), "clip {clip} accepted");
    }
}
