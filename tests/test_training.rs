//! Integration tests for candidate training, isolation and selection

use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView1};
use tabular_harness::data::{FieldKind, FieldValue, Record, Schema};
use tabular_harness::preprocessing::{EncodingPipeline, LabelRule};
use tabular_harness::training::{
    Classifier, Evaluator, MultiModelTrainer, Prediction, Trainer, TrainerRegistry,
    TrainingConfig, GAUSSIAN_NAIVE_BAYES, GRADIENT_BOOSTING, LOGISTIC_REGRESSION,
};
use tabular_harness::{HarnessError, Result};

// ============================================================================
// Stub candidates
// ============================================================================

/// Predicts the true label for rows with `id < correct_below` and the
/// opposite label for the rest
#[derive(Debug, Clone)]
struct StubModel {
    correct_below: f64,
}

impl Classifier for StubModel {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<Prediction> {
        let (id, flag) = (row[0], row[1] == 1.0);
        let label = if id < self.correct_below { flag } else { !flag };
        let probability = if label { 0.9 } else { 0.1 };
        Ok(Prediction { label, score: probability, probability })
    }
}

enum Behaviour {
    Correct(usize),
    Fail,
    Panic,
}

struct StubTrainer(Behaviour);

impl Trainer for StubTrainer {
    type Model = StubModel;

    fn train(&self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<StubModel> {
        match self.0 {
            Behaviour::Correct(k) => Ok(StubModel { correct_below: k as f64 }),
            Behaviour::Fail => Err(HarnessError::TrainingError("solver diverged".to_string())),
            Behaviour::Panic => panic!("stub trainer exploded"),
        }
    }
}

fn stub_schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .numeric("id")
            .boolean("flag")
            .target(FieldKind::Boolean, "label")
            .build()
            .unwrap(),
    )
}

/// Rows `0..n`; the label equals the `flag` feature
fn stub_rows(schema: &Arc<Schema>, n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let flag = i % 2 == 0;
            Record::new(
                Arc::clone(schema),
                vec![
                    FieldValue::Number(i as f64),
                    FieldValue::Bool(flag),
                    FieldValue::Bool(flag),
                ],
            )
            .unwrap()
        })
        .collect()
}

fn stub_pipeline() -> EncodingPipeline {
    EncodingPipeline::new(LabelRule::Binary)
        .pass_through("id")
        .pass_through("flag")
}

fn registry(candidates: Vec<(&str, Behaviour)>) -> TrainerRegistry<StubModel> {
    let mut registry = TrainerRegistry::new();
    for (name, behaviour) in candidates {
        registry.register(name, StubTrainer(behaviour)).unwrap();
    }
    registry
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_most_accurate_candidate_is_selected() {
    let schema = stub_schema();
    let train = stub_rows(&schema, 40);
    let test = stub_rows(&schema, 20);

    let trainer = MultiModelTrainer::new(registry(vec![
        ("A", Behaviour::Correct(14)),
        ("B", Behaviour::Correct(17)),
        ("C", Behaviour::Correct(16)),
    ]));
    let run = trainer.run(&stub_pipeline(), &train, &test).unwrap();

    let accuracies: Vec<f64> = run.leaderboard.iter().map(|r| r.accuracy).collect();
    assert_eq!(accuracies, vec![0.70, 0.85, 0.80]);
    assert_eq!(run.best().name, "B");
    assert!(run.failures.is_empty());
}

#[test]
fn test_tie_goes_to_earliest_registration() {
    let schema = stub_schema();
    let rows = stub_rows(&schema, 20);

    for parallel in [true, false] {
        let trainer = MultiModelTrainer::new(registry(vec![
            ("A", Behaviour::Correct(10)),
            ("B", Behaviour::Correct(18)),
            ("C", Behaviour::Correct(18)),
        ]))
        .with_parallel(parallel);
        let run = trainer.run(&stub_pipeline(), &rows, &rows).unwrap();
        assert_eq!(run.best().name, "B");
        assert_eq!(run.best_index, 1);
    }
}

// ============================================================================
// Isolation
// ============================================================================

#[test]
fn test_failing_candidate_is_dropped() {
    let schema = stub_schema();
    let train = stub_rows(&schema, 40);
    let test = stub_rows(&schema, 20);

    let trainer = MultiModelTrainer::new(registry(vec![
        ("A", Behaviour::Fail),
        ("B", Behaviour::Correct(17)),
        ("C", Behaviour::Correct(16)),
    ]));
    let run = trainer.run(&stub_pipeline(), &train, &test).unwrap();

    let names: Vec<&str> = run.leaderboard.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C"]);
    assert_eq!(run.best().name, "B");
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].name, "A");
    assert!(run.failures[0].reason.contains("solver diverged"));
}

#[test]
fn test_panicking_candidate_is_isolated() {
    let schema = stub_schema();
    let rows = stub_rows(&schema, 20);

    let trainer = MultiModelTrainer::new(registry(vec![
        ("A", Behaviour::Correct(12)),
        ("B", Behaviour::Panic),
    ]));
    let run = trainer.run(&stub_pipeline(), &rows, &rows).unwrap();
    assert_eq!(run.leaderboard.len(), 1);
    assert_eq!(run.best().name, "A");
    assert!(run.failures[0].reason.contains("stub trainer exploded"));
}

#[test]
fn test_all_candidates_failing_is_an_error() {
    let schema = stub_schema();
    let rows = stub_rows(&schema, 20);

    let trainer = MultiModelTrainer::new(registry(vec![
        ("A", Behaviour::Fail),
        ("B", Behaviour::Panic),
    ]));
    match trainer.run(&stub_pipeline(), &rows, &rows) {
        Err(HarnessError::AllCandidatesFailed(failures)) => {
            let names: Vec<&str> = failures.iter().map(|f| f.name.as_str()).collect();
            assert_eq!(names, vec!["A", "B"]);
        }
        other => panic!("expected AllCandidatesFailed, got {:?}", other.map(|r| r.best_index)),
    }
}

#[test]
fn test_empty_registry_is_rejected() {
    let schema = stub_schema();
    let rows = stub_rows(&schema, 10);
    let trainer = MultiModelTrainer::new(TrainerRegistry::<StubModel>::new());
    assert!(matches!(
        trainer.run(&stub_pipeline(), &rows, &rows),
        Err(HarnessError::Validation(_))
    ));
}

// ============================================================================
// Built-in candidates
// ============================================================================

fn numeric_schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .numeric("x1")
            .numeric("x2")
            .target(FieldKind::Boolean, "label")
            .build()
            .unwrap(),
    )
}

/// Two well separated clusters
fn separable_rows(schema: &Arc<Schema>, n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let positive = i % 2 == 0;
            let jitter = (i % 7) as f64 * 0.1;
            let (x1, x2) = if positive {
                (3.0 + jitter, 2.5 - jitter)
            } else {
                (-1.0 - jitter, 0.2 + jitter)
            };
            Record::new(
                Arc::clone(schema),
                vec![
                    FieldValue::Number(x1),
                    FieldValue::Number(x2),
                    FieldValue::Bool(positive),
                ],
            )
            .unwrap()
        })
        .collect()
}

#[test]
fn test_builtin_candidates_learn_separable_data() {
    let schema = numeric_schema();
    let train = separable_rows(&schema, 200);
    let test = separable_rows(&schema, 60);
    let pipeline = EncodingPipeline::new(LabelRule::Binary)
        .min_max("x1", Default::default())
        .min_max("x2", Default::default());

    let registry =
        TrainerRegistry::default_candidates(&TrainingConfig::default(), 42, 0.5).unwrap();
    let run = MultiModelTrainer::new(registry)
        .run(&pipeline, &train, &test)
        .unwrap();

    let names: Vec<&str> = run.leaderboard.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec![LOGISTIC_REGRESSION, GRADIENT_BOOSTING, GAUSSIAN_NAIVE_BAYES]);
    for result in &run.leaderboard {
        assert!(result.accuracy > 0.95, "{}: {}", result.name, result.accuracy);
        let c = &result.metrics.confusion;
        assert_eq!(c.tp + c.fp + c.tn + c.fn_, test.len());
        let recomputed = (c.tp + c.tn) as f64 / test.len() as f64;
        assert!((recomputed - result.accuracy).abs() < 1e-12);
    }
}

#[test]
fn test_parallel_and_sequential_runs_agree() {
    let schema = numeric_schema();
    let train = separable_rows(&schema, 120);
    let test = separable_rows(&schema, 40);
    let pipeline = EncodingPipeline::new(LabelRule::Binary)
        .min_max("x1", Default::default())
        .min_max("x2", Default::default());

    let run = |parallel: bool| {
        let registry =
            TrainerRegistry::default_candidates(&TrainingConfig::default(), 7, 0.5).unwrap();
        MultiModelTrainer::new(registry)
            .with_parallel(parallel)
            .run(&pipeline, &train, &test)
            .unwrap()
    };
    let a = run(true);
    let b = run(false);

    assert_eq!(a.best_index, b.best_index);
    for (x, y) in a.leaderboard.iter().zip(&b.leaderboard) {
        assert_eq!(x.name, y.name);
        assert_eq!(x.accuracy, y.accuracy);
        assert_eq!(x.metrics, y.metrics);
    }

    // The selected model reproduces its metrics from the fitted pipeline
    let best = a.best();
    let encoded = a.pipeline.encode(&test).unwrap();
    let predictions = best.model.predict(&encoded.features).unwrap();
    let metrics = Evaluator::evaluate(&predictions, &encoded.labels).unwrap();
    assert_eq!(metrics, best.metrics);
}
