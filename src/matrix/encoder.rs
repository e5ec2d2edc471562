//! Path to matrix encoding

use std::path::Path;
use ndarray::Array2;
use num_traits::{NumCast, Zero};
use crate::tree::TaxTree;
use crate::{Result, TaxoTreeError};

impl TaxTree {
    /// Encode every root-to-leaf path as a matrix row.
    ///
    /// Rows follow [`TaxTree::dfs_nodes`]; column `c` holds the payload of
    /// the node at level `c` on that path, or zero past the end of the path.
    /// Column 0 is the root payload on every row.
    pub fn get_matrix<T>(&self) -> Result<Array2<T>>
    where
        T: NumCast + Zero + Clone,
    {
        let paths = self.dfs_nodes();
        let ncol = self.depth() + 1;
        let nrow = paths.len();
        let mut matrix = Array2::zeros((nrow, ncol));

        for (row, path) in paths.iter().enumerate() {
            if path.len() > ncol {
                return Err(TaxoTreeError::EncodingError(format!(
                    "path of length {} exceeds {} columns",
                    path.len(),
                    ncol
                )));
            }
            for (col, id) in path.iter().enumerate() {
                let value = self
                    .get(id)
                    .map_err(|_| {
                        TaxoTreeError::EncodingError(format!("path references missing node {}", id))
                    })?
                    .data();
                matrix[[row, col]] = T::from(value).ok_or_else(|| {
                    TaxoTreeError::EncodingError(format!(
                        "payload {} of {} does not fit the matrix element type",
                        value, id
                    ))
                })?;
            }
        }

        log::debug!("encoded tree into {}x{} matrix", nrow, ncol);
        Ok(matrix)
    }

    /// Encode as single-precision floats
    pub fn get_matrix_f32(&self) -> Result<Array2<f32>> {
        self.get_matrix::<f32>()
    }

    /// Mask with the matrix's shape: `true` where the path has a node
    pub fn path_mask(&self) -> Array2<bool> {
        let paths = self.dfs_nodes();
        let mut mask = Array2::from_elem((paths.len(), self.depth() + 1), false);

        for (row, path) in paths.iter().enumerate() {
            for col in 0..path.len() {
                mask[[row, col]] = true;
            }
        }

        mask
    }

    /// Write the `f32` matrix to a `.npy` file
    pub fn to_matrix_npy<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let matrix = self.get_matrix_f32()?;
        write_matrix_npy(path, &matrix)
    }
}

/// Write a matrix with the standard `.npy` layout
pub(crate) fn write_matrix_npy<P, D>(path: P, array: &ndarray::Array<f32, D>) -> Result<()>
where
    P: AsRef<Path>,
    D: ndarray::Dimension,
{
    ndarray_npy::write_npy(path.as_ref(), array).map_err(|e| {
        TaxoTreeError::EncodingError(format!(
            "cannot write {}: {}",
            path.as_ref().display(),
            e
        ))
    })
}
