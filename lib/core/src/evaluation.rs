//! Ranking metrics over a precomputed neighbor matrix.
//!
//! Every metric takes ground-truth labels `y` (one per item) and an N×k
//! matrix of neighbor indices (row `i` holds the neighbors retrieved for
//! item `i`, nearest first, item `i` itself excluded). An item counts as
//! relevant to query `i` when it carries the label `y[i]`.
//!
//! Only the first `k` entries of each row are read.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mean fraction of the `k` neighbors sharing the query's label.
///
/// Every query contributes exactly `k` slots, so the mean is computed as
/// total hits over N·k in one division.
pub fn precision_at_k<L: PartialEq>(
    labels: &[L],
    neighbors: &[Vec<usize>],
    k: usize,
) -> Result<f64> {
    check_shape(labels.len(), neighbors, k)?;
    let hits: usize = neighbors
        .iter()
        .enumerate()
        .map(|(i, row)| row[..k].iter().filter(|&&j| labels[j] == labels[i]).count())
        .sum();
    Ok(hits as f64 / (labels.len() * k) as f64)
}

/// Mean hit rate: 1 for a query if **any** of its `k` neighbors shares its
/// label, else 0.
///
/// Note: this is a hit rate, not classic recall (relevant retrieved /
/// total relevant), despite the name.
pub fn recall_at_k<L: PartialEq>(labels: &[L], neighbors: &[Vec<usize>], k: usize) -> Result<f64> {
    check_shape(labels.len(), neighbors, k)?;
    Ok(mean_over_queries(labels, neighbors, k, |matches| {
        if matches.iter().any(|&m| m) {
            1.0
        } else {
            0.0
        }
    }))
}

/// Mean average precision at `k`.
///
/// For each matching rank `j` (1-based) the running precision `hits / j` is
/// accumulated; the sum is divided by `k`, not by the number of hits, so
/// queries with fewer than `k` relevant neighbors are penalized.
pub fn map_at_k<L: PartialEq>(labels: &[L], neighbors: &[Vec<usize>], k: usize) -> Result<f64> {
    check_shape(labels.len(), neighbors, k)?;
    Ok(mean_over_queries(labels, neighbors, k, |matches| {
        let mut hits = 0usize;
        let mut sum = 0.0f64;
        for (j, &m) in matches.iter().enumerate() {
            if m {
                hits += 1;
                sum += hits as f64 / (j + 1) as f64;
            }
        }
        sum / k as f64
    }))
}

/// Mean reciprocal rank of the first neighbor sharing the query's label
/// (0 for queries with no match in the top `k`).
pub fn mrr_at_k<L: PartialEq>(labels: &[L], neighbors: &[Vec<usize>], k: usize) -> Result<f64> {
    check_shape(labels.len(), neighbors, k)?;
    Ok(mean_over_queries(labels, neighbors, k, |matches| {
        matches
            .iter()
            .position(|&m| m)
            .map_or(0.0, |j| 1.0 / (j + 1) as f64)
    }))
}

/// Distinct item indices across the whole N×k matrix divided by N·k.
///
/// A single corpus-wide value, not a per-query mean.
pub fn diversity_at_k(neighbors: &[Vec<usize>], k: usize) -> Result<f64> {
    check_shape(neighbors.len(), neighbors, k)?;
    let distinct: HashSet<usize> = neighbors
        .iter()
        .flat_map(|row| row[..k].iter().copied())
        .collect();
    Ok(distinct.len() as f64 / (neighbors.len() * k) as f64)
}

/// All five metrics for one neighbor matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(rename = "precision_at_k")]
    pub precision: f64,
    /// Hit rate, see [`recall_at_k`]
    #[serde(rename = "recall_at_k")]
    pub recall: f64,
    #[serde(rename = "map_at_k")]
    pub map: f64,
    #[serde(rename = "mrr_at_k")]
    pub mrr: f64,
    #[serde(rename = "diversity_at_k")]
    pub diversity: f64,
    pub k: usize,
}

impl EvaluationReport {
    pub fn compute<L: PartialEq>(labels: &[L], neighbors: &[Vec<usize>], k: usize) -> Result<Self> {
        Ok(Self {
            precision: precision_at_k(labels, neighbors, k)?,
            recall: recall_at_k(labels, neighbors, k)?,
            map: map_at_k(labels, neighbors, k)?,
            mrr: mrr_at_k(labels, neighbors, k)?,
            diversity: diversity_at_k(neighbors, k)?,
            k,
        })
    }
}

fn check_shape(n_items: usize, neighbors: &[Vec<usize>], k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::invalid_argument("k must be at least 1"));
    }
    if n_items == 0 {
        return Err(Error::invalid_argument("cannot evaluate an empty item set"));
    }
    if neighbors.len() != n_items {
        return Err(Error::invalid_argument(format!(
            "neighbor matrix has {} rows, expected {n_items}",
            neighbors.len()
        )));
    }
    for (i, row) in neighbors.iter().enumerate() {
        if row.len() < k {
            return Err(Error::invalid_argument(format!(
                "neighbor row {i} has {} entries, k = {k}",
                row.len()
            )));
        }
        if let Some(&bad) = row[..k].iter().find(|&&j| j >= n_items) {
            return Err(Error::invalid_argument(format!(
                "neighbor row {i} references item {bad}, only {n_items} items"
            )));
        }
    }
    Ok(())
}

fn mean_over_queries<L, F>(labels: &[L], neighbors: &[Vec<usize>], k: usize, score: F) -> f64
where
    L: PartialEq,
    F: Fn(&[bool]) -> f64,
{
    let mut matches = Vec::with_capacity(k);
    let total: f64 = neighbors
        .iter()
        .enumerate()
        .map(|(i, row)| {
            matches.clear();
            matches.extend(row[..k].iter().map(|&j| labels[j] == labels[i]));
            score(&matches)
        })
        .sum();
    total / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    // labels: 0 0 1 1
    fn fixture() -> (Vec<u32>, Vec<Vec<usize>>) {
        let labels = vec![0, 0, 1, 1];
        let neighbors = vec![
            vec![1, 2], // hit at rank 1
            vec![2, 0], // hit at rank 2
            vec![0, 1], // no hit
            vec![2, 0], // hit at rank 1
        ];
        (labels, neighbors)
    }

    #[test]
    fn test_precision() {
        let (y, n) = fixture();
        assert!((precision_at_k(&y, &n, 2).unwrap() - 0.375).abs() < 1e-12);
        assert!((precision_at_k(&y, &n, 1).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_recall_is_hit_rate() {
        let (y, n) = fixture();
        assert!((recall_at_k(&y, &n, 2).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_map_divides_by_k() {
        let (y, n) = fixture();
        // (1/1)/2 + (1/2)/2 + 0 + (1/1)/2 = 1.25, / 4
        assert!((map_at_k(&y, &n, 2).unwrap() - 0.3125).abs() < 1e-12);
    }

    #[test]
    fn test_mrr() {
        let (y, n) = fixture();
        // 1 + 0.5 + 0 + 1 = 2.5, / 4
        assert!((mrr_at_k(&y, &n, 2).unwrap() - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_diversity() {
        let (_, n) = fixture();
        // distinct {0, 1, 2} over 8 slots
        assert!((diversity_at_k(&n, 2).unwrap() - 0.375).abs() < 1e-12);

        let all_distinct = vec![vec![1], vec![0]];
        assert_eq!(diversity_at_k(&all_distinct, 1).unwrap(), 1.0);
    }

    #[test]
    fn test_any_hit_gives_full_recall() {
        let y = vec![0u32, 0, 1, 1];
        // each query has exactly one same-label neighbor in its top 3
        let n = vec![vec![2, 3, 1], vec![3, 0, 2], vec![0, 3, 1], vec![1, 0, 2]];
        let p = precision_at_k(&y, &n, 3).unwrap();
        assert!((p - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(recall_at_k(&y, &n, 3).unwrap(), 1.0);
    }

    #[test]
    fn test_shape_errors() {
        let (y, n) = fixture();
        assert!(matches!(precision_at_k(&y, &n, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(precision_at_k(&y, &n, 3), Err(Error::InvalidArgument(_))));
        assert!(matches!(precision_at_k(&y[..3], &n, 1), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            diversity_at_k(&[vec![7]], 1),
            Err(Error::InvalidArgument(_))
        ));
        let empty: Vec<u32> = Vec::new();
        assert!(matches!(mrr_at_k(&empty, &[], 1), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_report_serializes_with_metric_names() {
        let (y, n) = fixture();
        let report = EvaluationReport::compute(&y, &n, 2).unwrap();
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["k"], 2);
        assert!(json.get("precision_at_k").is_some());
        assert!(json.get("diversity_at_k").is_some());
    }
}
