//! End-to-end tests: CSV on disk through selection, persistence and prediction

use std::path::Path;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tabular_harness::cli::{cmd_predict, cmd_run, RunOptions};
use tabular_harness::config::ExperimentConfig;
use tabular_harness::datasets;
use tabular_harness::experiment::Experiment;
use tabular_harness::inference::ModelHandle;

const INCOME_HEADER: [&str; 15] = [
    "age",
    "workclass",
    "fnlwgt",
    "education",
    "education_num",
    "marital_status",
    "occupation",
    "relationship",
    "race",
    "sex",
    "capital_gain",
    "capital_loss",
    "hours_per_week",
    "native_country",
    "income",
];

/// Adult-census shaped rows where a large capital gain or long hours mean >50K
fn write_income_csv(path: &Path, n: usize, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let workclasses = ["Private", "Self-emp-not-inc", "Local-gov", "State-gov", "Federal-gov"];
    let educations = [("HS-grad", 9), ("Some-college", 10), ("Bachelors", 13), ("Masters", 14)];
    let maritals = ["Married-civ-spouse", "Never-married", "Divorced"];
    let occupations = ["Exec-managerial", "Prof-specialty", "Craft-repair", "Service", "Sales"];
    let relationships = ["Husband", "Wife", "Not-in-family", "Own-child"];
    let races = ["White", "Black", "Asian-Pac-Islander"];
    let countries = ["United-States", "Mexico", "India"];

    let mut writer = csv::Writer::from_path(path).unwrap();
    writer.write_record(INCOME_HEADER).unwrap();
    for _ in 0..n {
        let (education, education_num) = *educations.choose(&mut rng).unwrap();
        let hours: u32 = rng.gen_range(20..=70);
        let capital_gain: u32 = if rng.gen_bool(0.12) { rng.gen_range(5000..=20000) } else { 0 };
        let capital_loss: u32 = if rng.gen_bool(0.05) { rng.gen_range(100..=2000) } else { 0 };
        let rich = capital_gain >= 5000 || hours >= 55;

        writer
            .write_record([
                rng.gen_range(18..=70u32).to_string(),
                format!(" {}", workclasses.choose(&mut rng).unwrap()),
                rng.gen_range(20_000..=400_000u32).to_string(),
                format!(" {}", education),
                education_num.to_string(),
                maritals.choose(&mut rng).unwrap().to_string(),
                occupations.choose(&mut rng).unwrap().to_string(),
                relationships.choose(&mut rng).unwrap().to_string(),
                races.choose(&mut rng).unwrap().to_string(),
                if rng.gen_bool(0.5) { "Male" } else { "Female" }.to_string(),
                capital_gain.to_string(),
                capital_loss.to_string(),
                hours.to_string(),
                countries.choose(&mut rng).unwrap().to_string(),
                if rich { " >50K" } else { " <=50K" }.to_string(),
            ])
            .unwrap();
    }
    writer.flush().unwrap();
}

fn write_bike_csv(path: &Path, n: usize, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer
        .write_record([
            "season",
            "month",
            "hour",
            "holiday",
            "weekday",
            "working_day",
            "weather_condition",
            "temperature",
            "humidity",
            "windspeed",
            "rental_type",
        ])
        .unwrap();
    for i in 0..n {
        let weekday = i % 7;
        let working_day = usize::from((1..=5).contains(&weekday));
        let hour = rng.gen_range(0..24usize);
        let long_term = working_day == 1 && (7..=18).contains(&hour);
        writer
            .write_record([
                (1 + i % 4).to_string(),
                (1 + i % 12).to_string(),
                hour.to_string(),
                "0".to_string(),
                weekday.to_string(),
                working_day.to_string(),
                rng.gen_range(1..=3u32).to_string(),
                format!("{:.1}", rng.gen_range(-5.0..35.0f64)),
                rng.gen_range(20..=95u32).to_string(),
                format!("{:.1}", rng.gen_range(0.0..40.0f64)),
                usize::from(long_term).to_string(),
            ])
            .unwrap();
    }
    writer.flush().unwrap();
}

// ============================================================================
// Income
// ============================================================================

#[test]
fn test_income_experiment_selects_accurate_model() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("adult.csv");
    write_income_csv(&data, 1500, 11);

    let descriptor = datasets::lookup("income").unwrap();
    let experiment = Experiment::new(descriptor.clone(), ExperimentConfig::default()).unwrap();
    let report = experiment.run(&data).unwrap();

    assert_eq!(report.summary.rows, 1000);
    assert_eq!(report.train_rows + report.test_rows, 1500);
    assert_eq!(report.test_rows, 300);
    assert!(report.best().accuracy > 0.9, "best accuracy {}", report.best().accuracy);
    for entry in &report.leaderboard {
        assert!(entry.accuracy <= report.best().accuracy);
    }

    let engine = report.handle.engine().unwrap();
    let examples = descriptor.example_records().unwrap();
    let (_, professional) = &examples[0];
    let (_, worker) = &examples[1];

    let high = engine.predict_one(professional).unwrap();
    assert!(high.probability > 0.5, "p = {}", high.probability);
    assert!(high.label);

    let low = engine.predict_one(worker).unwrap();
    assert!(low.probability < 0.5, "p = {}", low.probability);
    assert!(!low.label);
}

#[test]
fn test_max_rows_limits_the_experiment() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("adult.csv");
    write_income_csv(&data, 600, 5);

    let descriptor = datasets::lookup("income").unwrap();
    let config = ExperimentConfig::default()
        .with_max_rows(Some(250))
        .with_parallel_candidates(false);
    let report = Experiment::new(descriptor, config).unwrap().run(&data).unwrap();
    assert_eq!(report.train_rows + report.test_rows, 250);
    assert_eq!(report.test_rows, 50);
}

// ============================================================================
// Bike through the command layer
// ============================================================================

#[test]
fn test_bike_run_then_batch_predict() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("bike.csv");
    let model = dir.path().join("bike_model.json");
    let predictions = dir.path().join("predictions.csv");
    write_bike_csv(&data, 600, 21);

    let options = RunOptions {
        output: Some(model.clone()),
        seed: Some(13),
        ..Default::default()
    };
    cmd_run("bike", &data, &options).unwrap();
    assert!(model.exists());

    let handle: ModelHandle = ModelHandle::open(&model).unwrap();
    assert_eq!(handle.artifact().unwrap().dataset, "bike");

    cmd_predict("bike", &model, &data, Some(&predictions)).unwrap();
    let text = std::fs::read_to_string(&predictions).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("label,probability,score,confidence"));
    assert_eq!(lines.count(), 600);

    // A model saved for one dataset is refused for another
    assert!(cmd_predict("income", &model, &data, None).is_err());
}
