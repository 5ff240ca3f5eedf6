use faer::Mat;

use crate::types::{C64, DmdError};

/// Validate that a matrix meets minimum dimension requirements and contains
/// no NaN/Inf.
pub fn validate_matrix(x: &Mat<f64>, min_rows: usize, min_cols: usize) -> Result<(), DmdError> {
    let (rows, cols) = (x.nrows(), x.ncols());
    if rows < min_rows {
        return Err(DmdError::Validation(format!(
            "matrix has {rows} rows, need at least {min_rows}"
        )));
    }
    if cols < min_cols {
        return Err(DmdError::Validation(format!(
            "matrix has {cols} columns, need at least {min_cols}"
        )));
    }
    for j in 0..cols {
        for i in 0..rows {
            if !x[(i, j)].is_finite() {
                return Err(DmdError::Validation(
                    "matrix contains NaN or Inf values".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Determine truncation rank from singular values.
///
/// If `rank` is Some, clamp to valid range. Otherwise, select the smallest
/// rank capturing at least `threshold` fraction of total variance.
pub fn determine_rank(singular_values: &[f64], rank: Option<usize>, threshold: f64) -> usize {
    let n = singular_values.len();
    if n == 0 {
        return 0;
    }

    match rank {
        Some(r) => r.min(n).max(1),
        None => {
            let total: f64 = singular_values.iter().map(|s| s * s).sum();
            if total == 0.0 {
                return 1;
            }
            let mut cumulative = 0.0;
            for (i, &s) in singular_values.iter().enumerate() {
                cumulative += s * s;
                if cumulative / total >= threshold {
                    return i + 1;
                }
            }
            n
        }
    }
}

/// Conjugate Gram matrix Φ^H Φ of a row-major mode matrix.
pub(crate) fn conjugate_gram(modes: &[Vec<C64>]) -> Vec<Vec<C64>> {
    let rank = modes.first().map_or(0, Vec::len);
    let mut gram = vec![vec![C64::new(0.0, 0.0); rank]; rank];
    for p in 0..rank {
        for q in 0..rank {
            let mut val = C64::new(0.0, 0.0);
            for row in modes.iter() {
                val += row[p].conj() * row[q];
            }
            gram[p][q] = val;
        }
    }
    gram
}

/// Solve for amplitudes b via least-squares: Φ b ≈ x₀.
pub(crate) fn solve_amplitudes(modes: &[Vec<C64>], x0: &[f64]) -> Result<Vec<C64>, DmdError> {
    let rank = modes.first().map_or(0, Vec::len);
    let gram = conjugate_gram(modes);
    let mut rhs = vec![C64::new(0.0, 0.0); rank];
    for (p, entry) in rhs.iter_mut().enumerate() {
        let mut val = C64::new(0.0, 0.0);
        for (row, &x0_i) in modes.iter().zip(x0) {
            val += row[p].conj() * x0_i;
        }
        *entry = val;
    }
    complex_solve(&gram, &rhs)
}

/// Solve a complex linear system Ax = b using Gaussian elimination with
/// partial pivoting.
pub(crate) fn complex_solve(a: &[Vec<C64>], b: &[C64]) -> Result<Vec<C64>, DmdError> {
    let n = b.len();
    // Augmented matrix
    let mut aug: Vec<Vec<C64>> = a
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r.push(b[i]);
            r
        })
        .collect();

    for col in 0..n {
        let mut max_norm = aug[col][col].norm();
        let mut max_row = col;
        for row in (col + 1)..n {
            let norm = aug[row][col].norm();
            if norm > max_norm {
                max_norm = norm;
                max_row = row;
            }
        }
        if max_norm < 1e-14 {
            return Err(DmdError::SolveFailed("singular matrix".into()));
        }
        aug.swap(col, max_row);

        let pivot = aug[col][col];
        for row in (col + 1)..n {
            let factor = aug[row][col] / pivot;
            for j in col..=n {
                let sub = factor * aug[col][j];
                aug[row][j] -= sub;
            }
        }
    }

    // Back substitution
    let mut x = vec![C64::new(0.0, 0.0); n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum -= aug[i][j] * x[j];
        }
        x[i] = sum / aug[i][i];
    }

    Ok(x)
}
