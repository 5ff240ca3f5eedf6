use faer::Mat;

use crate::types::{C64, DmdError};

/// Accessor contract shared by all decompositions.
///
/// The derived quantities ([`dynamics`](Decomposition::dynamics),
/// [`reconstruction`](Decomposition::reconstruction),
/// [`reconstruction_error`](Decomposition::reconstruction_error), and the
/// continuous-time spectrum) are default methods computed only from the
/// trait's own public accessors. An implementation that remaps
/// [`modes`](Decomposition::modes) into a different space therefore changes
/// every derived quantity consistently without re-implementing them; the
/// unmapped value stays reachable through
/// [`raw_modes`](Decomposition::raw_modes).
pub trait Decomposition {
    /// Eigenvalues of the fitted evolution operator.
    fn eigenvalues(&self) -> &[C64];

    /// Mode amplitudes.
    fn amplitudes(&self) -> &[C64];

    /// Modes in the space of the fitted data matrix, row-major:
    /// `raw_modes()[i][j]` is mode `j` at degree of freedom `i`.
    fn raw_modes(&self) -> &[Vec<C64>];

    /// Matrix the reconstruction is compared against.
    fn data(&self) -> &Mat<f64>;

    /// Number of snapshot columns spanned by the fitted dynamics.
    fn snapshot_count(&self) -> usize;

    /// Time step between snapshots.
    fn dt(&self) -> f64;

    /// Mismatch between the operator's one-step prediction and the shifted
    /// snapshot set.
    fn projection_error(&self) -> Result<Mat<f64>, DmdError>;

    /// Noise removed from the first and second snapshot sets by the
    /// de-biased fit; zero matrices when de-noising was disabled.
    fn tlsq_error(&self) -> (Mat<f64>, Mat<f64>);

    /// Modes in the output space. Defaults to the raw modes.
    fn modes(&self) -> Vec<Vec<C64>> {
        self.raw_modes().to_vec()
    }

    /// Temporal dynamics: row `j` holds `b_j λ_j^k` for
    /// `k = 0..snapshot_count`.
    fn dynamics(&self) -> Vec<Vec<C64>> {
        let eigenvalues = self.eigenvalues();
        let amplitudes = self.amplitudes();
        let n_time = self.snapshot_count();
        let mut dynamics = vec![vec![C64::new(0.0, 0.0); n_time]; eigenvalues.len()];
        for (j, row) in dynamics.iter_mut().enumerate() {
            for (k, entry) in row.iter_mut().enumerate() {
                *entry = amplitudes[j] * eigenvalues[j].powf(k as f64);
            }
        }
        dynamics
    }

    /// Snapshot reconstruction: real part of `modes() × dynamics()`.
    fn reconstruction(&self) -> Mat<f64> {
        let modes = self.modes();
        let dynamics = self.dynamics();
        let n_time = self.snapshot_count();
        let mut recon = Mat::<f64>::zeros(modes.len(), n_time);
        for (i, mode_row) in modes.iter().enumerate() {
            for k in 0..n_time {
                let mut val = C64::new(0.0, 0.0);
                for (j, phi) in mode_row.iter().enumerate() {
                    val += phi * dynamics[j][k];
                }
                recon[(i, k)] = val.re;
            }
        }
        recon
    }

    /// Point-wise reconstruction error against the matching leading columns
    /// of the data matrix.
    fn reconstruction_error(&self) -> Mat<f64> {
        let mut recon = self.reconstruction();
        let dm = self.data();
        for k in 0..recon.ncols() {
            for i in 0..recon.nrows() {
                recon[(i, k)] -= dm[(i, k)];
            }
        }
        recon
    }

    /// Continuous-time eigenvalues ln(λ)/dt.
    fn eigenvalues_cont(&self) -> Vec<C64> {
        let dt = self.dt();
        self.eigenvalues().iter().map(|l| l.ln() / dt).collect()
    }

    /// Mode frequencies in cycles per time unit (signed).
    fn frequency(&self) -> Vec<f64> {
        let dt = self.dt();
        self.eigenvalues()
            .iter()
            .map(|l| l.arg() / (2.0 * std::f64::consts::PI * dt))
            .collect()
    }

    /// Exponential growth rates ln|λ|/dt.
    fn growth_rate(&self) -> Vec<f64> {
        let dt = self.dt();
        self.eigenvalues()
            .iter()
            .map(|l| l.norm().ln() / dt)
            .collect()
    }
}
