//! Binary classification metrics
//!
//! Positive class = `true`. Any ratio with a zero denominator is `None`
//! rather than an error or a silent zero.

use super::models::Prediction;
use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};

/// Confusion counts for binary classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(predicted: &[bool], truth: &[bool]) -> Self {
        let mut m = Self::default();
        for (&p, &t) in predicted.iter().zip(truth.iter()) {
            match (p, t) {
                (true, true) => m.tp += 1,
                (true, false) => m.fp += 1,
                (false, false) => m.tn += 1,
                (false, true) => m.fn_ += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

/// Test-set metrics for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub n: usize,
    pub accuracy: Option<f64>,
    pub auc: Option<f64>,
    /// F1 of the positive class
    pub f1: Option<f64>,
    pub positive_precision: Option<f64>,
    pub positive_recall: Option<f64>,
    pub negative_precision: Option<f64>,
    pub negative_recall: Option<f64>,
    pub confusion: ConfusionMatrix,
}

pub struct Evaluator;

impl Evaluator {
    pub fn evaluate(predictions: &[Prediction], truth: &[bool]) -> Result<BinaryMetrics> {
        if predictions.len() != truth.len() {
            return Err(HarnessError::ShapeError {
                expected: format!("{} predictions", truth.len()),
                actual: format!("{} predictions", predictions.len()),
            });
        }

        let predicted: Vec<bool> = predictions.iter().map(|p| p.label).collect();
        let cm = ConfusionMatrix::from_labels(&predicted, truth);

        let positive_precision = ratio(cm.tp, cm.tp + cm.fp);
        let positive_recall = ratio(cm.tp, cm.tp + cm.fn_);
        let f1 = match (positive_precision, positive_recall) {
            (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
            _ => None,
        };

        let probabilities: Vec<f64> = predictions.iter().map(|p| p.probability).collect();

        Ok(BinaryMetrics {
            n: cm.total(),
            accuracy: ratio(cm.tp + cm.tn, cm.total()),
            auc: Self::auc(&probabilities, truth),
            f1,
            positive_precision,
            positive_recall,
            negative_precision: ratio(cm.tn, cm.tn + cm.fn_),
            negative_recall: ratio(cm.tn, cm.tn + cm.fp),
            confusion: cm,
        })
    }

    /// Rank-based (Mann-Whitney) AUC with average ranks for tied scores.
    ///
    /// `None` when only one class is present.
    pub fn auc(scores: &[f64], truth: &[bool]) -> Option<f64> {
        let n_pos = truth.iter().filter(|&&t| t).count();
        let n_neg = truth.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return None;
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

        let mut rank_sum_pos = 0.0;
        let mut i = 0;
        while i < order.len() {
            let mut j = i;
            while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
                j += 1;
            }
            // Ranks are 1-based; tied block i..=j shares the average rank
            let avg_rank = (i + j) as f64 / 2.0 + 1.0;
            for &k in &order[i..=j] {
                if truth[k] {
                    rank_sum_pos += avg_rank;
                }
            }
            i = j + 1;
        }

        let n_pos = n_pos as f64;
        let n_neg = n_neg as f64;
        Some((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
    }
}
