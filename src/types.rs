use num_complex::Complex64;

/// Complex scalar used for eigenvalues, amplitudes, and modes.
pub type C64 = Complex64;

/// Error types for decomposition operations.
#[derive(Debug, thiserror::Error)]
pub enum DmdError {
    #[error("{0}")]
    Validation(String),

    #[error("SVD computation failed: {0}")]
    SvdFailed(String),

    #[error("eigendecomposition failed: {0}")]
    EigenFailed(String),

    #[error("linear solve failed: {0}")]
    SolveFailed(String),

    #[error("{0}")]
    NotImplemented(String),
}

/// Configuration of the base decomposition.
///
/// The higher-order decomposition forwards these options unmodified to its
/// internal base fit.
#[derive(Debug, Clone, Default)]
pub struct DmdOptions {
    /// Truncation rank of the operator fit. None for automatic selection
    /// (99% variance).
    pub rank: Option<usize>,
    /// Rank of the total-least-squares de-noising projection applied to the
    /// snapshot pair before the fit. None disables de-noising; the noise
    /// estimate is then zero.
    pub tlsq_rank: Option<usize>,
    /// Fit amplitudes against all snapshots instead of only the first one.
    pub optimal: bool,
}

/// Information about a single mode.
#[derive(Debug, Clone)]
pub struct ModeInfo {
    /// Mode index.
    pub index: usize,
    /// Complex eigenvalue.
    pub eigenvalue: C64,
    /// Eigenvalue magnitude |λ|.
    pub magnitude: f64,
    /// Eigenvalue phase angle (radians).
    pub phase: f64,
    /// Oscillation frequency (cycles per time unit, signed).
    pub frequency: f64,
    /// Oscillation period (in time units).
    pub period: f64,
    /// Growth rate (log|λ|/dt).
    pub growth_rate: f64,
    /// Half-life for decaying modes (positive), doubling time for growing
    /// (negative).
    pub half_life: Option<f64>,
    /// Stability classification.
    pub stability: Stability,
    /// Mode amplitude |b|.
    pub amplitude: f64,
}

/// Stability classification of a mode or system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Decaying,
    Neutral,
    Growing,
}

impl std::fmt::Display for Stability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stability::Decaying => write!(f, "decaying"),
            Stability::Neutral => write!(f, "neutral"),
            Stability::Growing => write!(f, "growing"),
        }
    }
}

/// Result of stability analysis.
#[derive(Debug, Clone)]
pub struct StabilityResult {
    /// Whether all modes are decaying or neutral.
    pub is_stable: bool,
    /// Whether any mode is growing.
    pub is_unstable: bool,
    /// Whether any mode is exactly neutral (within tolerance).
    pub is_marginal: bool,
    /// Maximum eigenvalue magnitude.
    pub spectral_radius: f64,
    /// Per-mode stability classification.
    pub mode_stability: Vec<Stability>,
}

/// Criterion for selecting dominant modes.
#[derive(Debug, Clone, Copy)]
pub enum DominantCriterion {
    /// Sort by amplitude |b|.
    Amplitude,
    /// Sort by energy |b| × |λ|.
    Energy,
    /// Sort by stability (closest to unit circle first).
    Stability,
}
