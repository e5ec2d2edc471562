//! Stacking per-sample matrices along a sample axis

use std::collections::BTreeMap;
use std::path::Path;
use ndarray::{Array2, Array3, Axis};
use serde::{Serialize, Deserialize};
use crate::{Result, TaxoTreeError};

/// Stack same-shaped matrices into a `(samples, rows, cols)` array
pub fn stack_matrices(matrices: &[Array2<f32>]) -> Result<Array3<f32>> {
    if matrices.is_empty() {
        return Err(TaxoTreeError::EncodingError("no matrices to stack".to_string()));
    }

    let views: Vec<_> = matrices.iter().map(|m| m.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| {
        TaxoTreeError::EncodingError(format!(
            "cannot stack matrices of shape {:?} and others: {}",
            matrices[0].shape(),
            e
        ))
    })
}

/// Encoded samples with parallel label arrays
///
/// `labels` maps a label name (e.g. a biome rank) to one value per sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleBatch {
    /// Matrices, shape `(samples, rows, cols)`
    pub matrices: Array3<f32>,
    /// Label arrays, each with one entry per sample
    pub labels: BTreeMap<String, Vec<String>>,
}

impl SampleBatch {
    /// Create a batch, checking every label array against the sample count
    pub fn new(matrices: Array3<f32>, labels: BTreeMap<String, Vec<String>>) -> Result<Self> {
        let n = matrices.len_of(Axis(0));
        for (name, values) in &labels {
            if values.len() != n {
                return Err(TaxoTreeError::EncodingError(format!(
                    "label {} has {} values for {} samples",
                    name,
                    values.len(),
                    n
                )));
            }
        }
        Ok(SampleBatch { matrices, labels })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.matrices.len_of(Axis(0))
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenate batches along the sample axis.
    ///
    /// All batches must share the matrix shape and the set of label names.
    pub fn merge(batches: &[SampleBatch]) -> Result<SampleBatch> {
        let first = batches
            .first()
            .ok_or_else(|| TaxoTreeError::EncodingError("no batches to merge".to_string()))?;

        let mut labels: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for batch in batches {
            if batch.labels.keys().ne(first.labels.keys()) {
                return Err(TaxoTreeError::EncodingError(
                    "batches carry different label names".to_string(),
                ));
            }
            for (name, values) in &batch.labels {
                labels.entry(name.clone()).or_default().extend(values.iter().cloned());
            }
        }

        let views: Vec<_> = batches.iter().map(|b| b.matrices.view()).collect();
        let matrices = ndarray::concatenate(Axis(0), &views)
            .map_err(|e| TaxoTreeError::EncodingError(format!("cannot merge batches: {}", e)))?;

        SampleBatch::new(matrices, labels)
    }

    /// Write `matrices.npy` and `labels.json` into a directory
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        super::encoder::write_matrix_npy(dir.join("matrices.npy"), &self.matrices)?;
        crate::utils::save_json(&self.labels, dir.join("labels.json"))
    }

    /// Read a batch written by [`SampleBatch::save`]
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let path = dir.join("matrices.npy");
        let matrices: Array3<f32> = ndarray_npy::read_npy(&path).map_err(|e| {
            TaxoTreeError::EncodingError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let labels = crate::utils::load_json(dir.join("labels.json"))?;
        SampleBatch::new(matrices, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(values: &[&str]) -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        map.insert(
            "label_0".to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        map
    }

    #[test]
    fn test_stack_matrices() {
        let a: Array2<f32> = array![[1.0, 2.0], [3.0, 4.0]];
        let b: Array2<f32> = array![[5.0, 6.0], [7.0, 8.0]];
        let stacked = stack_matrices(&[a, b]).unwrap();
        assert_eq!(stacked.shape(), &[2, 2, 2]);
        assert_eq!(stacked[[1, 0, 1]], 6.0);
    }

    #[test]
    fn test_stack_shape_mismatch() {
        let a: Array2<f32> = Array2::zeros((2, 3));
        let b: Array2<f32> = Array2::zeros((3, 3));
        assert!(matches!(stack_matrices(&[a, b]), Err(TaxoTreeError::EncodingError(_))));
        assert!(stack_matrices(&[]).is_err());
    }

    #[test]
    fn test_batch_label_length_checked() {
        let matrices = Array3::zeros((2, 1, 1));
        assert!(SampleBatch::new(matrices.clone(), labels(&["x"])).is_err());
        assert!(SampleBatch::new(matrices, labels(&["x", "y"])).is_ok());
    }

    #[test]
    fn test_merge_batches() {
        let one = SampleBatch::new(Array3::from_elem((1, 2, 2), 1.0), labels(&["soil"])).unwrap();
        let two = SampleBatch::new(
            Array3::from_elem((2, 2, 2), 2.0),
            labels(&["gut", "marine"]),
        )
        .unwrap();

        let merged = SampleBatch::merge(&[one, two]).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.labels["label_0"], vec!["soil", "gut", "marine"]);
        assert_eq!(merged.matrices[[0, 0, 0]], 1.0);
        assert_eq!(merged.matrices[[2, 1, 1]], 2.0);
    }

    #[test]
    fn test_merge_rejects_mismatched_labels() {
        let one = SampleBatch::new(Array3::zeros((1, 1, 1)), labels(&["soil"])).unwrap();
        let two = SampleBatch::new(Array3::zeros((1, 1, 1)), BTreeMap::new()).unwrap();
        assert!(SampleBatch::merge(&[one, two]).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let batch = SampleBatch::new(Array3::from_elem((2, 1, 3), 0.5), labels(&["a", "b"])).unwrap();
        let dir = std::env::temp_dir().join("taxo_tree_test_batch");

        batch.save(&dir).unwrap();
        let loaded = SampleBatch::load(&dir).unwrap();
        assert_eq!(loaded, batch);

        std::fs::remove_dir_all(&dir).ok();
    }
}
