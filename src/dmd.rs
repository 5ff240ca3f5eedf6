use faer::Mat;

use crate::decomposition::Decomposition;
use crate::svd::{factorize, Factorization};
use crate::types::{C64, DmdError, DmdOptions};
use crate::utils::{complex_solve, conjugate_gram, solve_amplitudes, validate_matrix};

/// Base dynamic mode decomposition over a snapshot matrix.
///
/// Fits a linear evolution model to the columns of the data matrix:
///
/// 1. Split X = dm[:, 0..n-1] and Y = dm[:, 1..n]
/// 2. Optional total-least-squares de-noising of the pair (X, Y)
/// 3. Truncated SVD: X ≈ U Σ Vᵀ
/// 4. Reduced operator: Ã = Uᵀ Y V Σ⁻¹
/// 5. Eigendecomposition: Ã W = W Λ
/// 6. Exact modes: Φ = Y V Σ⁻¹ W
/// 7. Amplitudes: Φ b ≈ x₀, or a least-squares fit over all snapshots
///
/// The higher-order decomposition constructs one of these over a reduced,
/// delay-embedded matrix and remaps its accessors; everything here stays
/// expressed through the [`Decomposition`] contract so that remapping works.
#[derive(Debug, Clone)]
pub struct Dmd {
    dm: Mat<f64>,
    x: Mat<f64>,
    y: Mat<f64>,
    noise_x: Mat<f64>,
    noise_y: Mat<f64>,
    svd: Factorization,
    a_tilde: Mat<f64>,
    eigenvalues: Vec<C64>,
    raw_modes: Vec<Vec<C64>>,
    amplitudes: Vec<C64>,
    dt: f64,
}

impl Dmd {
    /// Fit a decomposition to the data matrix.
    ///
    /// # Arguments
    /// * `dm` - Data matrix (m variables × n snapshots), columns are
    ///   time-ordered.
    /// * `dt` - Time step between snapshots.
    /// * `options` - Truncation rank, de-noising, and amplitude fit options.
    pub fn new(dm: Mat<f64>, dt: f64, options: &DmdOptions) -> Result<Self, DmdError> {
        validate_matrix(&dm, 1, 2)?;
        if dt <= 0.0 {
            return Err(DmdError::Validation(format!(
                "The time step 'dt' must be positive. Got {dt}"
            )));
        }

        let n_time = dm.ncols();
        let x_raw = dm.subcols(0, n_time - 1).to_owned();
        let y_raw = dm.subcols(1, n_time - 1).to_owned();

        let (x, y, noise_x, noise_y) = match options.tlsq_rank {
            Some(r) => tlsq_denoise(&x_raw, &y_raw, r)?,
            None => {
                let noise_x = Mat::<f64>::zeros(x_raw.nrows(), x_raw.ncols());
                let noise_y = Mat::<f64>::zeros(y_raw.nrows(), y_raw.ncols());
                (x_raw, y_raw, noise_x, noise_y)
            }
        };

        let svd = factorize(&x, options.rank)?;
        let rank = svd.rank();
        let s = svd.singular_values();

        // Reduced operator: Ã = Uᵀ Y V Σ⁻¹
        let ut_y = svd.u().transpose() * &y;
        let ut_y_v = &ut_y * svd.v();
        let mut a_tilde = Mat::<f64>::zeros(rank, rank);
        for i in 0..rank {
            for j in 0..rank {
                a_tilde[(i, j)] = ut_y_v[(i, j)] / s[j];
            }
        }

        // Eigendecomposition of Ã
        let eigen = a_tilde
            .as_ref()
            .eigen()
            .map_err(|e| DmdError::EigenFailed(format!("{e:?}")))?;

        let ev_diag = eigen.S().column_vector();
        let ev_vecs = eigen.U();

        let mut eigenvalues = Vec::with_capacity(rank);
        let mut w_re = Mat::<f64>::zeros(rank, rank);
        let mut w_im = Mat::<f64>::zeros(rank, rank);

        for j in 0..rank {
            let ev = ev_diag[j];
            eigenvalues.push(C64::new(ev.re, ev.im));
            for i in 0..rank {
                let w_ij = ev_vecs[(i, j)];
                w_re[(i, j)] = w_ij.re;
                w_im[(i, j)] = w_ij.im;
            }
        }

        // Exact modes: Φ = Y V Σ⁻¹ W
        let n_vars = y.nrows();
        let y_v = &y * svd.v();
        let mut y_v_sinv = Mat::<f64>::zeros(n_vars, rank);
        for i in 0..n_vars {
            for j in 0..rank {
                y_v_sinv[(i, j)] = y_v[(i, j)] / s[j];
            }
        }

        let modes_re = &y_v_sinv * &w_re;
        let modes_im = &y_v_sinv * &w_im;

        let mut raw_modes = vec![vec![C64::new(0.0, 0.0); rank]; n_vars];
        for i in 0..n_vars {
            for j in 0..rank {
                raw_modes[i][j] = C64::new(modes_re[(i, j)], modes_im[(i, j)]);
            }
        }

        let amplitudes = if options.optimal {
            solve_optimal_amplitudes(&raw_modes, &eigenvalues, &dm)?
        } else {
            let x0: Vec<f64> = (0..n_vars).map(|i| x[(i, 0)]).collect();
            solve_amplitudes(&raw_modes, &x0)?
        };

        Ok(Self {
            dm,
            x,
            y,
            noise_x,
            noise_y,
            svd,
            a_tilde,
            eigenvalues,
            raw_modes,
            amplitudes,
            dt,
        })
    }

    /// Truncation rank of the operator fit.
    pub fn rank(&self) -> usize {
        self.svd.rank()
    }

    /// Truncated SVD of the first snapshot set.
    pub fn svd(&self) -> &Factorization {
        &self.svd
    }

    /// Reduced evolution operator Ã (rank × rank).
    pub fn reduced_operator(&self) -> &Mat<f64> {
        &self.a_tilde
    }
}

impl Decomposition for Dmd {
    fn eigenvalues(&self) -> &[C64] {
        &self.eigenvalues
    }

    fn amplitudes(&self) -> &[C64] {
        &self.amplitudes
    }

    fn raw_modes(&self) -> &[Vec<C64>] {
        &self.raw_modes
    }

    fn data(&self) -> &Mat<f64> {
        &self.dm
    }

    fn snapshot_count(&self) -> usize {
        self.dm.ncols()
    }

    fn dt(&self) -> f64 {
        self.dt
    }

    /// Y − A X with A = Φ Λ Φ⁺, computed through the public `modes`
    /// accessor.
    fn projection_error(&self) -> Result<Mat<f64>, DmdError> {
        let modes = self.modes();
        let gram = conjugate_gram(&modes);
        let n_vars = modes.len();
        let rank = self.eigenvalues.len();
        let n_pairs = self.x.ncols();

        let mut err = Mat::<f64>::zeros(n_vars, n_pairs);
        for k in 0..n_pairs {
            // w = Φ⁺ x_k via (Φ^H Φ) w = Φ^H x_k
            let rhs: Vec<C64> = (0..rank)
                .map(|p| {
                    let mut val = C64::new(0.0, 0.0);
                    for i in 0..n_vars {
                        val += modes[i][p].conj() * self.x[(i, k)];
                    }
                    val
                })
                .collect();
            let w = complex_solve(&gram, &rhs)?;
            for i in 0..n_vars {
                let mut pred = C64::new(0.0, 0.0);
                for j in 0..rank {
                    pred += modes[i][j] * (self.eigenvalues[j] * w[j]);
                }
                err[(i, k)] = self.y[(i, k)] - pred.re;
            }
        }
        Ok(err)
    }

    fn tlsq_error(&self) -> (Mat<f64>, Mat<f64>) {
        (self.noise_x.clone(), self.noise_y.clone())
    }
}

/// Project the snapshot pair onto the leading right-singular subspace of the
/// stacked matrix [X; Y], removing components orthogonal to it.
///
/// Returns the de-noised pair and the removed noise pair.
fn tlsq_denoise(
    x: &Mat<f64>,
    y: &Mat<f64>,
    rank: usize,
) -> Result<(Mat<f64>, Mat<f64>, Mat<f64>, Mat<f64>), DmdError> {
    let n_vars = x.nrows();
    let n_pairs = x.ncols();

    let mut stacked = Mat::<f64>::zeros(2 * n_vars, n_pairs);
    for j in 0..n_pairs {
        for i in 0..n_vars {
            stacked[(i, j)] = x[(i, j)];
            stacked[(i + n_vars, j)] = y[(i, j)];
        }
    }

    let svd = stacked
        .svd()
        .map_err(|e| DmdError::SvdFailed(format!("{e:?}")))?;
    let v_full = svd.V();
    let r = rank.max(1).min(v_full.ncols());
    let vr = v_full.subcols(0, r).to_owned();

    let vr_t = vr.transpose().to_owned();
    let projector = &vr * &vr_t;
    let x_clean = x * &projector;
    let y_clean = y * &projector;

    let mut noise_x = Mat::<f64>::zeros(n_vars, n_pairs);
    let mut noise_y = Mat::<f64>::zeros(n_vars, n_pairs);
    for j in 0..n_pairs {
        for i in 0..n_vars {
            noise_x[(i, j)] = x[(i, j)] - x_clean[(i, j)];
            noise_y[(i, j)] = y[(i, j)] - y_clean[(i, j)];
        }
    }

    Ok((x_clean, y_clean, noise_x, noise_y))
}

/// Fit amplitudes over all snapshots: minimize ‖Φ diag(b) V(λ) − D‖_F.
///
/// Normal equations: ((Φ^H Φ) ∘ T) b = r with T[p][q] = Σₖ conj(λ_p)ᵏ λ_qᵏ
/// and r_p = Σₖ conj(λ_p)ᵏ (Φ^H dₖ)_p.
fn solve_optimal_amplitudes(
    modes: &[Vec<C64>],
    eigenvalues: &[C64],
    dm: &Mat<f64>,
) -> Result<Vec<C64>, DmdError> {
    let n_vars = modes.len();
    let rank = eigenvalues.len();
    let n_time = dm.ncols();

    // Eigenvalue powers λ_j^k, reused by both the system and the RHS
    let mut powers = vec![vec![C64::new(0.0, 0.0); n_time]; rank];
    for (j, row) in powers.iter_mut().enumerate() {
        for (k, entry) in row.iter_mut().enumerate() {
            *entry = eigenvalues[j].powf(k as f64);
        }
    }

    let gram = conjugate_gram(modes);
    let mut system = vec![vec![C64::new(0.0, 0.0); rank]; rank];
    for p in 0..rank {
        for q in 0..rank {
            let mut t = C64::new(0.0, 0.0);
            for k in 0..n_time {
                t += powers[p][k].conj() * powers[q][k];
            }
            system[p][q] = gram[p][q] * t;
        }
    }

    let mut rhs = vec![C64::new(0.0, 0.0); rank];
    for (p, entry) in rhs.iter_mut().enumerate() {
        let mut val = C64::new(0.0, 0.0);
        for k in 0..n_time {
            let mut proj = C64::new(0.0, 0.0);
            for i in 0..n_vars {
                proj += modes[i][p].conj() * dm[(i, k)];
            }
            val += powers[p][k].conj() * proj;
        }
        *entry = val;
    }

    complex_solve(&system, &rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn assert_near(a: f64, b: f64, eps: f64) {
        assert!(
            (a - b).abs() < eps,
            "expected {a} ≈ {b} (diff = {})",
            (a - b).abs()
        );
    }

    /// Create a simple oscillatory test system: two sinusoids.
    fn make_oscillatory_data(n_time: usize) -> Mat<f64> {
        let dt = 0.1;
        let mut x = Mat::<f64>::zeros(2, n_time);
        for t in 0..n_time {
            let time = t as f64 * dt;
            x[(0, t)] = (2.0 * PI * 0.5 * time).cos();
            x[(1, t)] = (2.0 * PI * 0.5 * time).sin();
        }
        x
    }

    #[test]
    fn test_dmd_basic() {
        let x = make_oscillatory_data(100);
        let dmd = Dmd::new(x, 0.1, &DmdOptions::default()).unwrap();

        assert!(dmd.rank() > 0);
        assert!(dmd.rank() <= 2);
        assert_eq!(dmd.eigenvalues().len(), dmd.rank());
        assert_eq!(dmd.amplitudes().len(), dmd.rank());
        assert_eq!(dmd.raw_modes().len(), 2);
    }

    #[test]
    fn test_dmd_eigenvalue_magnitude() {
        let x = make_oscillatory_data(200);
        let dmd = Dmd::new(x, 0.1, &DmdOptions::default()).unwrap();

        for ev in dmd.eigenvalues() {
            assert_near(ev.norm(), 1.0, 0.05);
        }
    }

    #[test]
    fn test_dmd_explicit_rank() {
        let x = make_oscillatory_data(100);
        let options = DmdOptions {
            rank: Some(2),
            ..Default::default()
        };
        let dmd = Dmd::new(x, 0.1, &options).unwrap();
        assert_eq!(dmd.rank(), 2);
    }

    #[test]
    fn test_dmd_reconstruction_accuracy() {
        let x = make_oscillatory_data(100);
        let options = DmdOptions {
            rank: Some(2),
            ..Default::default()
        };
        let dmd = Dmd::new(x.clone(), 0.1, &options).unwrap();

        let recon = dmd.reconstruction();
        assert_eq!(recon.nrows(), 2);
        assert_eq!(recon.ncols(), 100);
        for k in 0..100 {
            for i in 0..2 {
                assert_near(recon[(i, k)], x[(i, k)], 1e-6);
            }
        }
    }

    #[test]
    fn test_dmd_reconstruction_error_near_zero() {
        let x = make_oscillatory_data(120);
        let options = DmdOptions {
            rank: Some(2),
            ..Default::default()
        };
        let dmd = Dmd::new(x, 0.1, &options).unwrap();
        let err = dmd.reconstruction_error();
        for k in 0..err.ncols() {
            for i in 0..err.nrows() {
                assert_near(err[(i, k)], 0.0, 1e-6);
            }
        }
    }

    #[test]
    fn test_dmd_projection_error_near_zero() {
        let x = make_oscillatory_data(80);
        let options = DmdOptions {
            rank: Some(2),
            ..Default::default()
        };
        let dmd = Dmd::new(x, 0.1, &options).unwrap();
        let err = dmd.projection_error().unwrap();
        assert_eq!(err.nrows(), 2);
        assert_eq!(err.ncols(), 79);
        for k in 0..err.ncols() {
            for i in 0..err.nrows() {
                assert_near(err[(i, k)], 0.0, 1e-6);
            }
        }
    }

    #[test]
    fn test_dmd_tlsq_disabled_zero_noise() {
        let x = make_oscillatory_data(60);
        let dmd = Dmd::new(x, 0.1, &DmdOptions::default()).unwrap();
        let (noise_x, noise_y) = dmd.tlsq_error();
        assert_eq!(noise_x.nrows(), 2);
        assert_eq!(noise_x.ncols(), 59);
        for k in 0..59 {
            for i in 0..2 {
                assert_near(noise_x[(i, k)], 0.0, 1e-14);
                assert_near(noise_y[(i, k)], 0.0, 1e-14);
            }
        }
    }

    #[test]
    fn test_dmd_tlsq_removes_noise() {
        // Clean rank-2 signal plus a deterministic perturbation
        let mut x = make_oscillatory_data(100);
        for k in 0..100 {
            for i in 0..2 {
                x[(i, k)] += 0.01 * ((13 * k + 7 * i) % 17) as f64 / 17.0;
            }
        }
        let options = DmdOptions {
            rank: Some(2),
            tlsq_rank: Some(2),
            ..Default::default()
        };
        let dmd = Dmd::new(x, 0.1, &options).unwrap();
        let (noise_x, noise_y) = dmd.tlsq_error();

        let mut norm_sq = 0.0;
        for k in 0..noise_x.ncols() {
            for i in 0..noise_x.nrows() {
                norm_sq += noise_x[(i, k)] * noise_x[(i, k)] + noise_y[(i, k)] * noise_y[(i, k)];
            }
        }
        assert!(norm_sq > 0.0, "de-noising removed nothing");
    }

    #[test]
    fn test_dmd_optimal_amplitudes_match_on_clean_data() {
        let x = make_oscillatory_data(100);
        let plain = Dmd::new(
            x.clone(),
            0.1,
            &DmdOptions {
                rank: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        let optimal = Dmd::new(
            x,
            0.1,
            &DmdOptions {
                rank: Some(2),
                optimal: true,
                ..Default::default()
            },
        )
        .unwrap();

        // On noise-free data both fits reproduce the snapshots
        let err_plain = plain.reconstruction_error();
        let err_optimal = optimal.reconstruction_error();
        for k in 0..err_plain.ncols() {
            for i in 0..err_plain.nrows() {
                assert_near(err_plain[(i, k)], 0.0, 1e-6);
                assert_near(err_optimal[(i, k)], 0.0, 1e-6);
            }
        }
    }

    #[test]
    fn test_dmd_too_few_columns() {
        let x = Mat::<f64>::zeros(3, 1);
        assert!(Dmd::new(x, 0.1, &DmdOptions::default()).is_err());
    }

    #[test]
    fn test_dmd_invalid_dt() {
        let x = make_oscillatory_data(20);
        let err = Dmd::new(x, 0.0, &DmdOptions::default()).unwrap_err();
        assert!(err.to_string().contains("dt"));
    }
}
