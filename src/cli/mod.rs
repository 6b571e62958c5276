//! Tabular harness CLI module
//!
//! Command-line interface for running experiments, exploring datasets and
//! serving predictions from a saved model.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ExperimentConfig;
use crate::data::DatasetSummary;
use crate::datasets::{self, DatasetDescriptor};
use crate::experiment::{Experiment, ExperimentReport};
use crate::inference::{InferenceConfig, ModelHandle, PredictionEngine};
use crate::training::{BinaryMetrics, Evaluator, Prediction};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
    let _ = io::stdout().flush();
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn ratio(v: Option<f64>) -> String {
    v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "n/a".to_string())
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tabular-harness")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Binary classification experiments on tabular data")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train all candidates, keep the most accurate and save it
    Run {
        /// Dataset descriptor (income, bike)
        #[arg(long)]
        dataset: String,

        /// Input CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,

        /// JSON experiment configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed for the split and seeded candidates
        #[arg(long)]
        seed: Option<u64>,

        /// Share of rows held out for evaluation
        #[arg(long)]
        test_fraction: Option<f64>,

        /// Use at most this many rows
        #[arg(long)]
        max_rows: Option<usize>,

        /// Where to save the selected model
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Train candidates one after another
        #[arg(long)]
        sequential: bool,

        /// Start an interactive session after training
        #[arg(short, long)]
        interactive: bool,
    },

    /// Summarize a dataset
    Explore {
        /// Dataset descriptor (income, bike)
        #[arg(long)]
        dataset: String,

        /// Input CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,

        /// Number of rows to summarize
        #[arg(long, default_value = "1000")]
        rows: usize,
    },

    /// Predict every row of a CSV file with a saved model
    Predict {
        /// Dataset descriptor (income, bike)
        #[arg(long)]
        dataset: String,

        /// Saved model file
        #[arg(short, long)]
        model: PathBuf,

        /// Input CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,

        /// Output predictions file (CSV)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read inputs from stdin and predict each with a saved model
    Interactive {
        /// Dataset descriptor (income, bike)
        #[arg(long)]
        dataset: String,

        /// Saved model file
        #[arg(short, long)]
        model: PathBuf,

        /// Experiment config (JSON); only its inference section is used
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Experiment settings given on the command line
#[derive(Debug, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub test_fraction: Option<f64>,
    pub max_rows: Option<usize>,
    pub output: Option<PathBuf>,
    pub sequential: bool,
    pub interactive: bool,
}

impl RunOptions {
    /// File configuration (or defaults) with flags layered on top
    pub fn experiment_config(&self) -> anyhow::Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_file(path)?,
            None => ExperimentConfig::default(),
        };
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(fraction) = self.test_fraction {
            config = config.with_test_fraction(fraction);
        }
        if self.max_rows.is_some() {
            config = config.with_max_rows(self.max_rows);
        }
        if self.sequential {
            config = config.with_parallel_candidates(false);
        }
        config.validate()?;
        Ok(config)
    }
}

fn descriptor(name: &str) -> anyhow::Result<DatasetDescriptor> {
    Ok(datasets::lookup(name)?)
}

fn open_model(descriptor: &DatasetDescriptor, path: &Path) -> anyhow::Result<ModelHandle> {
    let handle = ModelHandle::open(path)
        .with_context(|| format!("loading model from {}", path.display()))?;
    if let Some(artifact) = handle.artifact() {
        if artifact.dataset != descriptor.name {
            anyhow::bail!(
                "model {} was trained on '{}', not '{}'",
                path.display(),
                artifact.dataset,
                descriptor.name
            );
        }
    }
    Ok(handle)
}

// ─── Reports ───────────────────────────────────────────────────────────────────

fn print_summary(summary: &DatasetSummary, target: &str) {
    println!("  {:<20} {}", muted("Rows"), summary.rows);
    println!();
    println!(
        "  {:<20} {:>12} {:>12} {:>12}",
        muted("Feature"),
        muted("Min"),
        muted("Max"),
        muted("Mean")
    );
    println!("  {}", dim(&"─".repeat(58)));
    for s in &summary.numeric {
        println!("  {:<20} {:>12.2} {:>12.2} {:>12.2}", s.name, s.min, s.max, s.mean);
    }

    println!();
    println!("  {} {}", muted("Distribution of"), target.white());
    for b in &summary.target {
        println!("  {:<20} {:>8} {:>9}", b.value, b.count, format!("{:.2}%", b.percent));
    }
}

fn print_leaderboard(report: &ExperimentReport) {
    println!(
        "  {:<24} {:>10} {:>10} {:>10} {:>10}",
        muted("Model"),
        muted("Accuracy"),
        muted("AUC"),
        muted("F1"),
        muted("Time")
    );
    println!("  {}", dim(&"─".repeat(68)));
    for (i, entry) in report.leaderboard.iter().enumerate() {
        let name = if i == report.best_index {
            entry.name.white().bold()
        } else {
            entry.name.normal()
        };
        println!(
            "  {:<24} {:>10.4} {:>10} {:>10} {:>10.2?}",
            name,
            entry.accuracy,
            ratio(entry.metrics.auc),
            ratio(entry.metrics.f1),
            entry.training_time
        );
    }
    for failure in &report.failures {
        println!(
            "  {:<24} {}",
            failure.name,
            format!("failed: {}", failure.reason).red()
        );
    }
    println!("  {}", dim(&"─".repeat(68)));
}

fn print_metrics(metrics: &BinaryMetrics, positive: &str, negative: &str) {
    let rows: &[(&str, Option<f64>)] = &[
        ("Accuracy", metrics.accuracy),
        ("AUC", metrics.auc),
        ("F1", metrics.f1),
        ("Precision (+)", metrics.positive_precision),
        ("Recall (+)", metrics.positive_recall),
        ("Precision (-)", metrics.negative_precision),
        ("Recall (-)", metrics.negative_recall),
    ];
    for (name, value) in rows {
        println!("  {:<20} {}", muted(name), ratio(*value).white());
    }

    let c = &metrics.confusion;
    println!();
    println!(
        "  {:<20} {:>14} {:>14}",
        muted("Actual \\ Predicted"),
        muted(positive),
        muted(negative)
    );
    println!("  {:<20} {:>14} {:>14}", positive, c.tp, c.fn_);
    println!("  {:<20} {:>14} {:>14}", negative, c.fp, c.tn);
    println!("  {:<20} {}", muted("Total"), c.total());
}

fn print_prediction(descriptor: &DatasetDescriptor, prediction: &Prediction) {
    let label = if prediction.label {
        &descriptor.positive_name
    } else {
        &descriptor.negative_name
    };
    println!(
        "    {} {}  {} {:.2}%  {} {:.2}%",
        muted("prediction"),
        label.white().bold(),
        muted("p(+)"),
        prediction.probability * 100.0,
        muted("confidence"),
        prediction.confidence() * 100.0
    );
}

fn demo_predictions(
    descriptor: &DatasetDescriptor,
    engine: &PredictionEngine,
) -> anyhow::Result<()> {
    for (title, record) in descriptor.example_records()? {
        let prediction = engine.predict_one(&record)?;
        println!();
        println!("  {}", title.white());
        let fields: Vec<String> = record
            .schema()
            .fields()
            .iter()
            .zip(record.values())
            .filter(|(f, _)| f.name != record.schema().target().name)
            .map(|(f, v)| format!("{}={}", f.name, v))
            .collect();
        println!("    {}", dim(&fields.join(", ")));
        print_prediction(descriptor, &prediction);
    }
    Ok(())
}

fn interactive_session(
    descriptor: &DatasetDescriptor,
    engine: &PredictionEngine,
    config: &InferenceConfig,
) -> anyhow::Result<()> {
    section("Interactive prediction");
    let fields: Vec<&str> = descriptor
        .schema
        .fields()
        .iter()
        .filter(|f| f.name != descriptor.schema.target().name)
        .map(|f| f.name.as_str())
        .collect();
    println!("  {} {}", muted("Fields"), fields.join(", "));
    println!(
        "  {}",
        dim(&format!(
            "enter a JSON object or name=value pairs, '{}' to quit",
            config.sentinel
        ))
    );
    println!();

    let session = descriptor.session(config).with_prompt("  › ");
    let stdin = io::stdin();
    let summary = engine.run_interactive(&session, stdin.lock(), io::stdout().lock())?;
    println!();
    println!(
        "  {} {} predictions, {} rejected inputs",
        dim("session ended:"),
        summary.predictions,
        summary.errors
    );
    Ok(())
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(dataset: &str, data_path: &Path, options: &RunOptions) -> anyhow::Result<()> {
    let descriptor = descriptor(dataset)?;
    let config = options.experiment_config()?;
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_model.json", descriptor.name)));
    let experiment = Experiment::new(descriptor.clone(), config.clone())?;

    section(&descriptor.title);

    // Step 1
    section("Step 1: Data loading and analysis");
    step_run("Loading data");
    let start = Instant::now();
    let dataset = experiment
        .load(data_path)
        .with_context(|| format!("loading {}", data_path.display()))?;
    step_done(&format!("{} rows in {:.2?}", dataset.len(), start.elapsed()));
    let summary = experiment.explore(&dataset);
    println!();
    print_summary(&summary, &descriptor.schema.target().name);

    // Step 2
    section("Step 2: Train/test split");
    step_run("Splitting");
    let partition = experiment.split(&dataset)?;
    step_done(&format!(
        "{} train / {} test (seed {})",
        partition.train.len(),
        partition.test.len(),
        config.seed
    ));

    // Step 3
    section("Step 3: Training and model selection");
    step_run("Training candidates");
    let start = Instant::now();
    let run = experiment.train(&partition).context("training candidates")?;
    step_done(&format!("{:.2?}", start.elapsed()));
    let report = experiment.conclude(summary, &partition, run);
    println!();
    print_leaderboard(&report);

    let best = report.best();
    println!();
    println!(
        "  {} {} {} {:.4}",
        ok("best"),
        best.name.white().bold(),
        muted("accuracy:"),
        best.accuracy
    );
    println!();
    print_metrics(&best.metrics, &descriptor.positive_name, &descriptor.negative_name);

    // Step 4
    section("Step 4: Saving the model");
    step_run(&format!("Saving → {}", output.display()));
    let handle = report
        .handle
        .persist(&output)
        .with_context(|| format!("saving model to {}", output.display()))?;
    step_done("");
    step_run("Reloading");
    let handle = handle.load()?;
    let engine = handle
        .engine()?
        .with_parallel_batch(config.inference.parallel_batch);
    step_done(handle.state());

    // Step 5
    section("Step 5: Example predictions");
    demo_predictions(&descriptor, &engine)?;

    if options.interactive {
        interactive_session(&descriptor, &engine, &config.inference)?;
    }

    println!();
    Ok(())
}

pub fn cmd_explore(dataset: &str, data_path: &Path, rows: usize) -> anyhow::Result<()> {
    let descriptor = descriptor(dataset)?;
    section(&format!("Explore · {}", descriptor.name));

    step_run("Loading data");
    let start = Instant::now();
    let dataset = descriptor
        .loader()
        .with_max_rows(Some(rows))
        .load(data_path)
        .with_context(|| format!("loading {}", data_path.display()))?;
    step_done(&format!("{} rows in {:.2?}", dataset.len(), start.elapsed()));
    println!();

    let summary = crate::data::Explorer::summarize(dataset.records());
    print_summary(&summary, &descriptor.schema.target().name);
    println!();
    Ok(())
}

pub fn cmd_predict(
    dataset: &str,
    model_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let descriptor = descriptor(dataset)?;
    section("Predict");

    step_run("Loading model");
    let handle = open_model(&descriptor, model_path)?;
    let engine = handle.engine()?;
    step_done(&model_path.display().to_string());

    step_run("Loading data");
    let dataset = descriptor
        .loader()
        .load(data_path)
        .with_context(|| format!("loading {}", data_path.display()))?;
    step_done(&format!("{} rows", dataset.len()));

    step_run("Predicting");
    let start = Instant::now();
    let predictions = engine.predict_batch(dataset.records())?;
    step_done(&format!("{:.2?}", start.elapsed()));

    let positives = predictions.iter().filter(|p| p.label).count();
    println!();
    println!("  {:<20} {}", muted(&descriptor.positive_name), positives);
    println!(
        "  {:<20} {}",
        muted(&descriptor.negative_name),
        predictions.len() - positives
    );

    // Labelled input: report how the saved model does on it
    let truth: crate::error::Result<Vec<bool>> = dataset
        .records()
        .iter()
        .map(|r| engine.pipeline().label(r))
        .collect();
    if let Ok(truth) = truth {
        let metrics = Evaluator::evaluate(&predictions, &truth)?;
        println!();
        print_metrics(&metrics, &descriptor.positive_name, &descriptor.negative_name);
    }

    if let Some(path) = output {
        step_run(&format!("Saving → {}", path.display()));
        write_predictions(path, &descriptor, &predictions)?;
        step_done(&format!("{} rows", predictions.len()));
    }

    println!();
    Ok(())
}

/// One CSV row per prediction: label, probability, score, confidence
pub fn write_predictions(
    path: &Path,
    descriptor: &DatasetDescriptor,
    predictions: &[Prediction],
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["label", "probability", "score", "confidence"])?;
    for p in predictions {
        let label = if p.label {
            &descriptor.positive_name
        } else {
            &descriptor.negative_name
        };
        writer.write_record([
            label.to_string(),
            p.probability.to_string(),
            p.score.to_string(),
            p.confidence().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn cmd_interactive(
    dataset: &str,
    model_path: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let descriptor = descriptor(dataset)?;
    let handle = open_model(&descriptor, model_path)?;
    let config = match config_path {
        Some(path) => Some(ExperimentConfig::from_file(path)?.inference),
        None => None,
    };
    let engine = session_engine(&handle, config.as_ref())?;
    let config = config.unwrap_or_default();
    interactive_session(&descriptor, &engine, &config)
}

/// Engine for a loaded model; an inference config overrides the saved
/// decision threshold and the batch mode.
pub fn session_engine(
    handle: &ModelHandle,
    config: Option<&InferenceConfig>,
) -> anyhow::Result<PredictionEngine> {
    let Some(config) = config else {
        return Ok(handle.engine()?);
    };
    let artifact = handle
        .artifact()
        .ok_or_else(|| anyhow::anyhow!("model is {}; load it first", handle.state()))?;
    let model = artifact.model.clone().with_threshold(config.classification_threshold);
    Ok(PredictionEngine::new(artifact.pipeline.clone(), model)
        .with_parallel_batch(config.parallel_batch))
}

/// Run the parsed command line; no subcommand prints help
pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run {
            dataset,
            data,
            config,
            seed,
            test_fraction,
            max_rows,
            output,
            sequential,
            interactive,
        }) => {
            let options = RunOptions {
                config,
                seed,
                test_fraction,
                max_rows,
                output,
                sequential,
                interactive,
            };
            cmd_run(&dataset, &data, &options)
        }
        Some(Commands::Explore { dataset, data, rows }) => cmd_explore(&dataset, &data, rows),
        Some(Commands::Predict { dataset, model, data, output }) => {
            cmd_predict(&dataset, &model, &data, output.as_deref())
        }
        Some(Commands::Interactive { dataset, model, config }) => {
            cmd_interactive(&dataset, &model, config.as_deref())
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "tabular-harness",
            "run",
            "--dataset",
            "income",
            "--data",
            "adult.csv",
            "--seed",
            "7",
            "--sequential",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Run { dataset, seed, sequential, interactive, .. }) => {
                assert_eq!(dataset, "income");
                assert_eq!(seed, Some(7));
                assert!(sequential);
                assert!(!interactive);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_parses_interactive_config() {
        let cli = Cli::try_parse_from([
            "tabular-harness",
            "interactive",
            "--dataset",
            "bike",
            "--model",
            "bike_model.json",
            "--config",
            "serve.json",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Interactive { dataset, config, .. }) => {
                assert_eq!(dataset, "bike");
                assert_eq!(config, Some(PathBuf::from("serve.json")));
            }
            _ => panic!("expected interactive"),
        }
    }

    #[test]
    fn test_run_options_override_defaults() {
        let options = RunOptions {
            seed: Some(9),
            test_fraction: Some(0.3),
            sequential: true,
            ..Default::default()
        };
        let config = options.experiment_config().unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.test_fraction, 0.3);
        assert!(!config.parallel_candidates);
    }

    #[test]
    fn test_run_options_reject_bad_fraction() {
        let options = RunOptions { test_fraction: Some(1.5), ..Default::default() };
        assert!(options.experiment_config().is_err());
    }

    #[test]
    fn test_write_predictions_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let descriptor = datasets::lookup("bike").unwrap();
        let predictions = vec![
            Prediction { label: true, score: 1.2, probability: 0.8 },
            Prediction { label: false, score: -0.4, probability: 0.4 },
        ];
        write_predictions(&path, &descriptor, &predictions).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "label,probability,score,confidence");
        assert!(lines[1].starts_with("long-term,0.8,1.2,0.8"));
        assert!(lines[2].starts_with("short-term,0.4,-0.4,0.6"));
    }
}
