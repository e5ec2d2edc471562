//! Row selection over stacked sample matrices
//!
//! A stack has shape `(samples, paths, levels)`. Selection works on its
//! sum over samples: a path (row) is kept when its cells clear a threshold
//! relative to the mean of their level column. The importance variant asks
//! an [`ImportanceModel`] how much each path matters for predicting a label
//! at every level, then thresholds those scores the same way.

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use crate::{Result, TaxoTreeError};

/// A model that scores how much each feature contributes to a target.
///
/// `x` is `(samples, features)`, `y` has one value per sample; the result
/// has one score per feature.
pub trait ImportanceModel: Sync {
    /// Fit on `(x, y)` and return per-feature importances
    fn feature_importances(&self, x: ArrayView2<f32>, y: ArrayView1<f32>) -> Result<Array1<f32>>;
}

/// Absolute Pearson correlation of each feature with the target.
///
/// Constant features score 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationImportance;

impl ImportanceModel for CorrelationImportance {
    fn feature_importances(&self, x: ArrayView2<f32>, y: ArrayView1<f32>) -> Result<Array1<f32>> {
        if x.nrows() != y.len() {
            return Err(TaxoTreeError::Model(format!(
                "{} samples but {} targets",
                x.nrows(),
                y.len()
            )));
        }
        let n = y.len() as f64;
        if n == 0.0 {
            return Ok(Array1::zeros(x.ncols()));
        }

        let y_mean = y.iter().map(|&v| v as f64).sum::<f64>() / n;
        let scores = x.axis_iter(Axis(1)).map(|column| {
            let x_mean = column.iter().map(|&v| v as f64).sum::<f64>() / n;
            let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
            for (&xi, &yi) in column.iter().zip(y.iter()) {
                let dx = xi as f64 - x_mean;
                let dy = yi as f64 - y_mean;
                cov += dx * dy;
                var_x += dx * dx;
                var_y += dy * dy;
            }
            if var_x == 0.0 || var_y == 0.0 {
                0.0
            } else {
                (cov / (var_x.sqrt() * var_y.sqrt())).abs() as f32
            }
        });
        Ok(Array1::from_iter(scores))
    }
}

/// Per-column thresholds `c * mean`
fn column_thresholds(matrix: &Array2<f32>, coefficient: f32) -> Array1<f32> {
    matrix
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(matrix.ncols()))
        .mapv(|mean| coefficient * mean)
}

/// Threshold-based path selection over a stack of sample matrices
#[derive(Clone, Debug)]
pub struct Selector {
    matrices: Array3<f32>,
    sum_matrix: Array2<f32>,
    is_nonzero: Array2<bool>,
    basic_select: Array1<bool>,
    feature_importance: Option<Array2<f32>>,
    importance_select: Array1<bool>,
}

impl Selector {
    /// Create a selector over a `(samples, paths, levels)` stack
    pub fn new(matrices: Array3<f32>) -> Self {
        let sum_matrix = matrices.sum_axis(Axis(0));
        let is_nonzero = sum_matrix.mapv(|v| v != 0.0);
        let n_paths = sum_matrix.nrows();
        Selector {
            matrices,
            sum_matrix,
            is_nonzero,
            basic_select: Array1::from_elem(n_paths, false),
            feature_importance: None,
            importance_select: Array1::from_elem(n_paths, false),
        }
    }

    /// The stacked matrices
    pub fn matrices(&self) -> &Array3<f32> {
        &self.matrices
    }

    /// Sum over samples, `(paths, levels)`
    pub fn sum_matrix(&self) -> &Array2<f32> {
        &self.sum_matrix
    }

    /// Non-zero cells of the sum matrix
    pub fn is_nonzero(&self) -> &Array2<bool> {
        &self.is_nonzero
    }

    /// Importances from the last [`Selector::cal_feature_importance`]
    pub fn feature_importance(&self) -> Option<&Array2<f32>> {
        self.feature_importance.as_ref()
    }

    /// Select paths whose non-zero cells are all `>= c * column mean`.
    ///
    /// Zero cells never count, passing or not: with `c == 0`, or in a
    /// column summing to zero, a path is still judged on its non-zero
    /// cells alone. Paths with no non-zero cell are kept.
    pub fn run_basic_select(&mut self, coefficient: f32) -> &Array1<bool> {
        let thresholds = column_thresholds(&self.sum_matrix, coefficient);
        let selected = self
            .sum_matrix
            .outer_iter()
            .zip(self.is_nonzero.outer_iter())
            .map(|(sums, nonzero)| {
                sums.iter()
                    .zip(nonzero.iter())
                    .zip(thresholds.iter())
                    .all(|((&sum, &nonzero), &threshold)| !nonzero || sum >= threshold)
            });
        self.basic_select = Array1::from_iter(selected);

        log::debug!(
            "basic selection kept {} of {} paths",
            self.basic_select.iter().filter(|&&kept| kept).count(),
            self.basic_select.len()
        );
        &self.basic_select
    }

    /// Score every path at every level with `model`.
    ///
    /// Level `i` is fitted on `matrices[:, :, i]` against `labels`; the
    /// levels are fitted in parallel.
    pub fn cal_feature_importance<M>(&mut self, labels: ArrayView1<f32>, model: &M) -> Result<()>
    where
        M: ImportanceModel + ?Sized,
    {
        let (n_samples, n_paths, n_levels) = self.matrices.dim();
        if labels.len() != n_samples {
            return Err(TaxoTreeError::Model(format!(
                "{} labels for {} samples",
                labels.len(),
                n_samples
            )));
        }

        let matrices = &self.matrices;
        let columns: Vec<Array1<f32>> = (0..n_levels)
            .into_par_iter()
            .map(|level| {
                let scores = model.feature_importances(matrices.index_axis(Axis(2), level), labels)?;
                if scores.len() != n_paths {
                    return Err(TaxoTreeError::Model(format!(
                        "level {}: {} importances for {} paths",
                        level,
                        scores.len(),
                        n_paths
                    )));
                }
                Ok(scores)
            })
            .collect::<Result<_>>()?;

        let mut importance = Array2::<f32>::zeros((n_paths, n_levels));
        for (level, scores) in columns.iter().enumerate() {
            importance.column_mut(level).assign(scores);
        }
        self.feature_importance = Some(importance);
        Ok(())
    }

    /// Select paths whose importances clear `c * column mean`.
    ///
    /// For a path with `k` non-zero cells, the first `k` importance cells
    /// of its row must pass.
    pub fn run_importance_select(&mut self, coefficient: f32) -> Result<&Array1<bool>> {
        let importance = self.feature_importance.as_ref().ok_or_else(|| {
            TaxoTreeError::InvalidConfig("feature importances have not been computed".to_string())
        })?;
        let thresholds = column_thresholds(importance, coefficient);

        let selected = importance
            .outer_iter()
            .zip(self.is_nonzero.outer_iter())
            .map(|(scores, nonzero)| {
                let n_nonzero = nonzero.iter().filter(|&&nz| nz).count();
                scores
                    .iter()
                    .zip(thresholds.iter())
                    .take(n_nonzero)
                    .all(|(&score, &threshold)| score >= threshold)
            });
        self.importance_select = Array1::from_iter(selected);

        log::debug!(
            "importance selection kept {} of {} paths",
            self.importance_select.iter().filter(|&&kept| kept).count(),
            self.importance_select.len()
        );
        Ok(&self.importance_select)
    }

    /// Keep only the selected paths of the stack
    pub fn filter_paths(&self, mask: &Array1<bool>) -> Result<Array3<f32>> {
        if mask.len() != self.sum_matrix.nrows() {
            return Err(TaxoTreeError::EncodingError(format!(
                "mask of length {} for {} paths",
                mask.len(),
                self.sum_matrix.nrows()
            )));
        }
        let kept: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|&(_, &keep)| keep)
            .map(|(i, _)| i)
            .collect();
        Ok(self.matrices.select(Axis(1), &kept))
    }
}
