use faer::Mat;

use crate::types::DmdError;
use crate::utils::{determine_rank, validate_matrix};

/// Truncated orthogonal factorization of a snapshot matrix.
///
/// Produced by [`factorize`] or supplied pre-computed to avoid repeating the
/// SVD when several decompositions share one data matrix.
#[derive(Debug, Clone)]
pub struct Factorization {
    u: Mat<f64>,
    s: Vec<f64>,
    v: Mat<f64>,
    rank: usize,
}

impl Factorization {
    /// Orthonormal basis of the dominant left singular subspace
    /// (rows × rank).
    pub fn u(&self) -> &Mat<f64> {
        &self.u
    }

    /// Leading singular values.
    pub fn singular_values(&self) -> &[f64] {
        &self.s
    }

    /// Right singular vectors (cols × rank).
    pub fn v(&self) -> &Mat<f64> {
        &self.v
    }

    /// Effective rank of the truncation.
    pub fn rank(&self) -> usize {
        self.rank
    }
}

/// Compute a truncated SVD of the matrix.
///
/// With `target_rank = None` the rank is chosen as the smallest value
/// capturing 99% of the variance; an explicit rank is clamped to the number
/// of available singular values.
pub fn factorize(matrix: &Mat<f64>, target_rank: Option<usize>) -> Result<Factorization, DmdError> {
    validate_matrix(matrix, 1, 1)?;

    let svd = matrix
        .svd()
        .map_err(|e| DmdError::SvdFailed(format!("{e:?}")))?;
    let u_full = svd.U();
    let v_full = svd.V();
    let s_col = svd.S().column_vector();

    let n_sv = s_col.nrows();
    let s_vals: Vec<f64> = (0..n_sv).map(|i| s_col[i]).collect();

    let rank = determine_rank(&s_vals, target_rank, 0.99);

    Ok(Factorization {
        u: u_full.subcols(0, rank).to_owned(),
        s: s_vals[..rank].to_vec(),
        v: v_full.subcols(0, rank).to_owned(),
        rank,
    })
}
