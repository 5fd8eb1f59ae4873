//! Tabular feature extractor
//!
//! Standardizes every numeric column (zero mean, unit population variance)
//! and then keeps the `k` columns with the highest one-way ANOVA F-statistic
//! against the item labels.

use fusionrec_core::{Error, Matrix, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of columns kept by the selector
pub const DEFAULT_K_BEST: usize = 4;

/// Per-column standardization parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Learn column means and standard deviations.
    ///
    /// Columns with (near) zero variance get a scale of 1 so they map to 0
    /// instead of dividing by zero.
    pub fn fit(x: &Matrix) -> Result<Self> {
        if x.is_empty() {
            return Err(Error::invalid_training_data("cannot fit scaler on zero rows"));
        }
        let n = x.n_rows() as f64;

        let mut mean = vec![0.0f64; x.n_cols()];
        for row in x.rows() {
            for (m, &v) in mean.iter_mut().zip(row) {
                *m += v as f64;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0f64; x.n_cols()];
        for row in x.rows() {
            for ((s, &m), &v) in var.iter_mut().zip(&mean).zip(row) {
                let d = v as f64 - m;
                *s += d * d;
            }
        }

        let scale = var
            .into_iter()
            .zip(&mean)
            .map(|(s, &m)| {
                let var = s / n;
                // variance within rounding noise of the mean counts as constant
                let bound = n * f64::EPSILON * var + (n * m * f64::EPSILON).powi(2);
                let std = var.sqrt();
                if var <= bound || std < 10.0 * f64::EPSILON {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        if x.n_cols() != self.mean.len() {
            return Err(Error::invalid_argument(format!(
                "scaler fitted on {} columns, got {}",
                self.mean.len(),
                x.n_cols()
            )));
        }
        let mut out = Matrix::zeros(x.n_rows(), x.n_cols());
        for i in 0..x.n_rows() {
            let src = x.row(i);
            for (j, dst) in out.row_mut(i).iter_mut().enumerate() {
                *dst = ((src[j] as f64 - self.mean[j]) / self.scale[j]) as f32;
            }
        }
        Ok(out)
    }

    /// Check that a decoded scaler is usable: one finite, non-zero scale
    /// per mean.
    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            return Err(Error::invalid_argument(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(Error::invalid_argument("scaler scale must be finite and non-zero"));
        }
        Ok(())
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

/// One-way ANOVA F-statistic of every column against `labels`.
///
/// A constant column yields NaN (0/0); a column that is constant within each
/// class but differs between classes yields +inf.
pub fn f_classif(x: &Matrix, labels: &[u32]) -> Vec<f64> {
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(i);
    }

    let n_total = labels.len();
    let n_classes = groups.len();
    let df_between = n_classes.saturating_sub(1) as f64;
    let df_within = n_total.saturating_sub(n_classes) as f64;

    (0..x.n_cols())
        .map(|j| {
            let grand_mean = x.rows().map(|r| r[j] as f64).sum::<f64>() / n_total as f64;

            let mut ss_between = 0.0f64;
            let mut ss_within = 0.0f64;
            for members in groups.values() {
                let group_mean =
                    members.iter().map(|&i| x.get(i, j) as f64).sum::<f64>() / members.len() as f64;
                ss_between += members.len() as f64 * (group_mean - grand_mean).powi(2);
                ss_within += members
                    .iter()
                    .map(|&i| (x.get(i, j) as f64 - group_mean).powi(2))
                    .sum::<f64>();
            }

            (ss_between / df_between) / (ss_within / df_within)
        })
        .collect()
}

/// Keeps the `k` columns with the highest F-statistic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectKBest {
    scores: Vec<f64>,
    selected: Vec<usize>,
}

impl SelectKBest {
    /// Rank columns by F-statistic and keep the top `k` (capped at the column
    /// count). NaN scores rank lowest; on equal scores the later column wins.
    /// Kept columns stay in their original order.
    pub fn fit(x: &Matrix, labels: &[u32], k: usize) -> Result<Self> {
        let scores = f_classif(x, labels);
        let k = k.min(x.n_cols());

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| rank_key(scores[a]).total_cmp(&rank_key(scores[b])));

        let mut selected = order.split_off(order.len() - k);
        selected.sort_unstable();

        Ok(Self { scores, selected })
    }

    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        if x.n_cols() != self.scores.len() {
            return Err(Error::invalid_argument(format!(
                "selector fitted on {} columns, got {}",
                self.scores.len(),
                x.n_cols()
            )));
        }
        x.select_columns(&self.selected)
    }

    /// Check that a decoded selector is usable: strictly ascending,
    /// in-range, non-empty column selection.
    pub fn validate(&self) -> Result<()> {
        if self.selected.is_empty() {
            return Err(Error::invalid_argument("selector keeps no columns"));
        }
        if self.selected.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::invalid_argument("selected columns must be strictly ascending"));
        }
        if let Some(&bad) = self.selected.iter().find(|&&c| c >= self.scores.len()) {
            return Err(Error::invalid_argument(format!(
                "selected column {bad} out of range for {} columns",
                self.scores.len()
            )));
        }
        Ok(())
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }
}

fn rank_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

/// Fitted tabular extractor: scaler followed by column selector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabularExtractor {
    scaler: StandardScaler,
    selector: SelectKBest,
}

impl TabularExtractor {
    /// Fit on an item-by-attribute matrix with one label per row.
    ///
    /// Fails with `InvalidTrainingData` on zero rows or columns, non-finite
    /// values, a label count that differs from the row count, or fewer than
    /// two distinct labels.
    pub fn fit(x: &Matrix, labels: &[u32], k_best: usize) -> Result<Self> {
        if k_best == 0 {
            return Err(Error::configuration("k_best must be at least 1"));
        }
        validate_training_matrix(x, labels)?;

        let scaler = StandardScaler::fit(x)?;
        let scaled = scaler.transform(x)?;
        let selector = SelectKBest::fit(&scaled, labels, k_best)?;

        tracing::debug!(
            columns = x.n_cols(),
            selected = ?selector.selected(),
            scores = ?selector.scores(),
            "fitted tabular extractor"
        );

        Ok(Self { scaler, selector })
    }

    /// Fit and return the transformed training block in one pass.
    pub fn fit_transform(x: &Matrix, labels: &[u32], k_best: usize) -> Result<(Self, Matrix)> {
        let extractor = Self::fit(x, labels, k_best)?;
        let block = extractor.transform(x)?;
        Ok((extractor, block))
    }

    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let scaled = self.scaler.transform(x)?;
        self.selector.transform(&scaled)
    }

    /// Transform a single raw attribute row.
    pub fn transform_row(&self, row: &[f32]) -> Result<Vec<f32>> {
        let x = Matrix::from_vec(1, row.len(), row.to_vec())?;
        Ok(self.transform(&x)?.row(0).to_vec())
    }

    /// Check that scaler and selector agree on the input width.
    pub fn validate(&self) -> Result<()> {
        self.scaler.validate()?;
        self.selector.validate()?;
        if self.scaler.mean().len() != self.selector.scores().len() {
            return Err(Error::invalid_argument(format!(
                "scaler covers {} columns, selector {}",
                self.scaler.mean().len(),
                self.selector.scores().len()
            )));
        }
        Ok(())
    }

    pub fn n_features_in(&self) -> usize {
        self.scaler.mean().len()
    }

    pub fn n_features_out(&self) -> usize {
        self.selector.selected().len()
    }

    pub fn selected_columns(&self) -> &[usize] {
        self.selector.selected()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn selector(&self) -> &SelectKBest {
        &self.selector
    }
}

fn validate_training_matrix(x: &Matrix, labels: &[u32]) -> Result<()> {
    if x.is_empty() || x.n_cols() == 0 {
        return Err(Error::invalid_training_data(format!(
            "tabular block is empty ({} x {})",
            x.n_rows(),
            x.n_cols()
        )));
    }
    if labels.len() != x.n_rows() {
        return Err(Error::invalid_training_data(format!(
            "tabular block has {} rows but {} labels were given",
            x.n_rows(),
            labels.len()
        )));
    }
    for (i, row) in x.rows().enumerate() {
        if let Some(j) = row.iter().position(|v| !v.is_finite()) {
            return Err(Error::invalid_training_data(format!(
                "tabular value at row {i}, column {j} is not finite"
            )));
        }
    }
    let first = labels[0];
    if labels.iter().all(|&l| l == first) {
        return Err(Error::invalid_training_data(
            "tabular feature selection needs labels with at least two distinct classes",
        ));
    }
    Ok(())
}
