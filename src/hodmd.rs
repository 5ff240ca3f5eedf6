use faer::Mat;

use crate::decomposition::Decomposition;
use crate::dmd::Dmd;
use crate::svd::{factorize, Factorization};
use crate::types::{C64, DmdError, DmdOptions};
use crate::utils::validate_matrix;

/// Configuration of the higher-order decomposition.
#[derive(Debug, Clone, Default)]
pub struct HodmdOptions {
    /// Number of stacked time levels. None for one third of the snapshot
    /// count.
    pub delay: Option<usize>,
    /// Target rank of the initial dimensionality reduction. None for
    /// automatic selection.
    pub rank_dr: Option<usize>,
    /// Pre-computed factorization of the data matrix, reused instead of
    /// recomputing. Must have as many basis rows as the data matrix; whether
    /// it was actually computed from this matrix is the caller's
    /// responsibility.
    pub factorization: Option<Factorization>,
    /// Options forwarded unmodified to the base decomposition.
    pub dmd: DmdOptions,
}

/// Higher-order dynamic mode decomposition.
///
/// Wraps the base decomposition with an initial dimensionality reduction and
/// an enrichment of the data matrix with time delays (a Hankel structure),
/// following Clainche and Vega (<https://doi.org/10.1137/15M1054924>). The
/// base fit runs on the reduced, delay-embedded matrix; the accessor
/// overrides below map modes and errors back into the original space, so
/// every derived quantity of the [`Decomposition`] contract comes out in
/// original coordinates.
///
/// The original data matrix is borrowed for the lifetime of the object: the
/// reconstruction error is recomputed against it on every access.
#[derive(Debug)]
pub struct Hodmd<'a> {
    dm_org: &'a Mat<f64>,
    svd_dr: Factorization,
    delay: usize,
    base: Dmd,
}

impl<'a> Hodmd<'a> {
    /// Create a higher-order decomposition from a data matrix and time step.
    ///
    /// # Arguments
    /// * `data_matrix` - Snapshot matrix (rows = degrees of freedom,
    ///   columns = snapshots).
    /// * `dt` - Time step between two snapshots.
    /// * `options` - Delay, reduction rank, optional pre-computed
    ///   factorization, and forwarded base options.
    pub fn new(
        data_matrix: &'a Mat<f64>,
        dt: f64,
        options: HodmdOptions,
    ) -> Result<Self, DmdError> {
        validate_matrix(data_matrix, 1, 1)?;
        if dt <= 0.0 {
            return Err(DmdError::Validation(format!(
                "The time step 'dt' must be positive. Got {dt}"
            )));
        }
        let rows_org = data_matrix.nrows();
        let cols_org = data_matrix.ncols();

        let delay = options.delay.unwrap_or(cols_org / 3);
        if delay < 1 {
            return Err(DmdError::Validation(format!(
                "The 'delay' parameter must be a positive integer. Got {delay}"
            )));
        }
        // At least two columns must remain after the embedding
        if cols_org <= delay {
            return Err(DmdError::Validation(format!(
                "The number of snapshots ({cols_org}) must be larger than the number of time delays ({delay})"
            )));
        }

        let svd_dr = match options.factorization {
            Some(factorization) => {
                if factorization.u().nrows() != rows_org {
                    return Err(DmdError::Validation(format!(
                        "factorization basis has {} rows, data matrix has {rows_org}",
                        factorization.u().nrows()
                    )));
                }
                factorization
            }
            None => factorize(data_matrix, options.rank_dr)?,
        };

        let reduced = svd_dr.u().transpose() * data_matrix;
        let embedded = build_time_delays(&reduced, delay);
        let base = Dmd::new(embedded, dt, &options.dmd)?;

        Ok(Self {
            dm_org: data_matrix,
            svd_dr,
            delay,
            base,
        })
    }

    /// Factorization used for the initial dimensionality reduction.
    pub fn factorization(&self) -> &Factorization {
        &self.svd_dr
    }

    /// Number of stacked time levels.
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Rank of the initial dimensionality reduction.
    pub fn rank(&self) -> usize {
        self.svd_dr.rank()
    }

    /// The owned base decomposition over the delay-embedded matrix.
    pub fn base(&self) -> &Dmd {
        &self.base
    }

    /// Restrict to the undelayed block and map through the reduction basis.
    fn map_rows(&self, m: &Mat<f64>) -> Mat<f64> {
        let undelayed = m.subrows(0, self.svd_dr.rank()).to_owned();
        self.svd_dr.u() * &undelayed
    }
}

/// Enrich the reduced matrix with time delays.
///
/// Stacks `delay` column-shifted windows vertically: block `d` (0-indexed)
/// holds columns `[d, cols - delay + d]` of the input, so the result has
/// shape (delay · rows) × (cols − delay + 1).
fn build_time_delays(reduced: &Mat<f64>, delay: usize) -> Mat<f64> {
    let rows = reduced.nrows();
    let cols = reduced.ncols();
    let n_cols = cols - delay + 1;
    let mut embedded = Mat::<f64>::zeros(delay * rows, n_cols);
    for d in 0..delay {
        for i in 0..rows {
            for t in 0..n_cols {
                embedded[(d * rows + i, t)] = reduced[(i, t + d)];
            }
        }
    }
    embedded
}

impl Decomposition for Hodmd<'_> {
    fn eigenvalues(&self) -> &[C64] {
        self.base.eigenvalues()
    }

    fn amplitudes(&self) -> &[C64] {
        self.base.amplitudes()
    }

    fn raw_modes(&self) -> &[Vec<C64>] {
        self.base.raw_modes()
    }

    fn data(&self) -> &Mat<f64> {
        self.dm_org
    }

    fn snapshot_count(&self) -> usize {
        self.base.snapshot_count()
    }

    fn dt(&self) -> f64 {
        self.base.dt()
    }

    /// Modes in the original space.
    ///
    /// Only the first set of embedded-space modes is kept (the rows of the
    /// undelayed block); higher-shift blocks are redundant copies used to
    /// fit the higher-order dynamics. The kept block is mapped through the
    /// reduction basis.
    fn modes(&self) -> Vec<Vec<C64>> {
        let rank_dr = self.svd_dr.rank();
        let raw = self.base.modes();
        let u = self.svd_dr.u();
        let n_modes = self.base.eigenvalues().len();
        let rows_org = u.nrows();

        let mut mapped = vec![vec![C64::new(0.0, 0.0); n_modes]; rows_org];
        for (i, row) in mapped.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                let mut val = C64::new(0.0, 0.0);
                for (k, raw_row) in raw.iter().take(rank_dr).enumerate() {
                    val += raw_row[j] * u[(i, k)];
                }
                *entry = val;
            }
        }
        mapped
    }

    fn projection_error(&self) -> Result<Mat<f64>, DmdError> {
        let err = self.base.projection_error()?;
        Ok(self.map_rows(&err))
    }

    fn tlsq_error(&self) -> (Mat<f64>, Mat<f64>) {
        let (noise_x, noise_y) = self.base.tlsq_error();
        (self.map_rows(&noise_x), self.map_rows(&noise_y))
    }
}
