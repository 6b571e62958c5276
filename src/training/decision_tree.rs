//! Depth-limited regression trees on gradient statistics
//!
//! Trees are grown level by level. Each feature is scanned once per level
//! in a presorted order, evaluating every node of the level in the same
//! pass; leaves carry Newton steps `-G / (H + lambda)`.

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits shared by every tree of an ensemble
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub reg_lambda: f64,
}

/// Per-feature row order, sorted by value, computed once per fit
pub struct SortedColumns {
    order: Vec<Vec<u32>>,
}

impl SortedColumns {
    pub fn new(x: &Array2<f64>) -> Self {
        let order = (0..x.ncols())
            .into_par_iter()
            .map(|j| {
                let col = x.column(j);
                let mut idx: Vec<u32> = (0..x.nrows() as u32).collect();
                idx.sort_by(|&a, &b| col[a as usize].total_cmp(&col[b as usize]));
                idx
            })
            .collect();
        Self { order }
    }
}

/// Flat regression tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Stats {
    g: f64,
    h: f64,
    n: usize,
}

impl Stats {
    fn add(&mut self, g: f64, h: f64) {
        self.g += g;
        self.h += h;
        self.n += 1;
    }

    fn score(&self, lambda: f64) -> f64 {
        self.g * self.g / (self.h + lambda)
    }

    fn leaf(&self, lambda: f64) -> f64 {
        -self.g / (self.h + lambda)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Rows belonging to no open node
const CLOSED: u32 = u32::MAX;

impl RegressionTree {
    /// Grow one tree on the rows where `in_sample` is true.
    ///
    /// `gradients` and `hessians` are indexed by row of `x`.
    pub fn fit(
        x: &Array2<f64>,
        sorted: &SortedColumns,
        gradients: &[f64],
        hessians: &[f64],
        in_sample: &[bool],
        params: &TreeParams,
    ) -> Self {
        let lambda = params.reg_lambda;
        let min_leaf = params.min_samples_leaf.max(1);

        let mut root = Stats::default();
        for i in 0..x.nrows() {
            if in_sample[i] {
                root.add(gradients[i], hessians[i]);
            }
        }

        let mut nodes = vec![TreeNode::Leaf { value: root.leaf(lambda) }];
        // open[k] = (tree node index, stats) for slot k of the current level
        let mut open: Vec<(usize, Stats)> = vec![(0, root)];
        let mut slot_of: Vec<u32> = in_sample.iter().map(|&s| if s { 0 } else { CLOSED }).collect();

        for _ in 0..params.max_depth {
            if open.is_empty() {
                break;
            }

            let per_feature: Vec<Vec<Option<Candidate>>> = sorted
                .order
                .par_iter()
                .enumerate()
                .map(|(feature, order)| {
                    best_splits_for_feature(
                        x.column(feature),
                        feature,
                        order,
                        &slot_of,
                        &open,
                        gradients,
                        hessians,
                        min_leaf,
                        lambda,
                    )
                })
                .collect();

            // Lowest feature index wins ties
            let mut best: Vec<Option<Candidate>> = vec![None; open.len()];
            for feature_best in per_feature {
                for (slot, cand) in feature_best.into_iter().enumerate() {
                    if let Some(c) = cand {
                        if best[slot].map_or(true, |b| c.gain > b.gain) {
                            best[slot] = Some(c);
                        }
                    }
                }
            }

            let mut next_open: Vec<(usize, Stats)> = Vec::new();
            let mut remap: Vec<Option<(u32, u32, usize, f64)>> = vec![None; open.len()];
            for (slot, cand) in best.iter().enumerate() {
                let Some(c) = cand else { continue };
                let (node_idx, _) = open[slot];
                let left = nodes.len();
                let right = left + 1;
                nodes.push(TreeNode::Leaf { value: 0.0 });
                nodes.push(TreeNode::Leaf { value: 0.0 });
                nodes[node_idx] = TreeNode::Split {
                    feature: c.feature,
                    threshold: c.threshold,
                    left,
                    right,
                };
                let left_slot = next_open.len() as u32;
                next_open.push((left, Stats::default()));
                next_open.push((right, Stats::default()));
                remap[slot] = Some((left_slot, left_slot + 1, c.feature, c.threshold));
            }

            for i in 0..slot_of.len() {
                let slot = slot_of[i];
                if slot == CLOSED {
                    continue;
                }
                match remap[slot as usize] {
                    Some((l, r, feature, threshold)) => {
                        let target = if x[[i, feature]] <= threshold { l } else { r };
                        slot_of[i] = target;
                        next_open[target as usize].1.add(gradients[i], hessians[i]);
                    }
                    None => slot_of[i] = CLOSED,
                }
            }

            for (node_idx, stats) in &next_open {
                nodes[*node_idx] = TreeNode::Leaf { value: stats.leaf(lambda) };
            }
            open = next_open;
        }

        Self { nodes }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Largest feature index referenced by a split
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }
}

#[allow(clippy::too_many_arguments)]
fn best_splits_for_feature(
    column: ArrayView1<'_, f64>,
    feature: usize,
    order: &[u32],
    slot_of: &[u32],
    open: &[(usize, Stats)],
    gradients: &[f64],
    hessians: &[f64],
    min_leaf: usize,
    lambda: f64,
) -> Vec<Option<Candidate>> {
    let mut left: Vec<Stats> = vec![Stats::default(); open.len()];
    let mut last: Vec<f64> = vec![f64::NAN; open.len()];
    let mut best: Vec<Option<Candidate>> = vec![None; open.len()];

    for &row in order {
        let row = row as usize;
        let slot = slot_of[row];
        if slot == CLOSED {
            continue;
        }
        let slot = slot as usize;
        let value = column[row];
        let total = open[slot].1;
        let l = left[slot];

        // Candidate boundary between the previous distinct value and this one
        if l.n >= min_leaf && total.n - l.n >= min_leaf && value > last[slot] {
            let r = Stats { g: total.g - l.g, h: total.h - l.h, n: total.n - l.n };
            let gain = l.score(lambda) + r.score(lambda) - total.score(lambda);
            if gain > 1e-12 && best[slot].map_or(true, |b| gain > b.gain) {
                best[slot] = Some(Candidate {
                    feature,
                    threshold: (last[slot] + value) / 2.0,
                    gain,
                });
            }
        }

        left[slot].add(gradients[row], hessians[row]);
        last[slot] = value;
    }

    best
}
