use faer::Mat;

use crate::decomposition::Decomposition;
use crate::types::{C64, DmdError, DominantCriterion, ModeInfo, Stability, StabilityResult};

/// Analyze the eigenvalue spectrum of a decomposition.
///
/// Returns per-mode information: magnitude, phase, frequency, growth rate,
/// half-life, and stability classification.
pub fn spectrum(decomposition: &impl Decomposition) -> Vec<ModeInfo> {
    let dt = decomposition.dt();
    let eigenvalues = decomposition.eigenvalues();
    let amplitudes = decomposition.amplitudes();

    let mut info = Vec::with_capacity(eigenvalues.len());
    for (i, lambda) in eigenvalues.iter().enumerate() {
        let magnitude = lambda.norm();
        let phase = lambda.arg();
        let frequency = phase / (2.0 * std::f64::consts::PI * dt);
        let period = if frequency.abs() > 1e-14 {
            1.0 / frequency.abs()
        } else {
            f64::INFINITY
        };
        let growth_rate = magnitude.ln() / dt;
        let half_life = if growth_rate.abs() > 1e-14 {
            Some(-(2.0_f64.ln()) / growth_rate)
        } else {
            None
        };

        info.push(ModeInfo {
            index: i,
            eigenvalue: *lambda,
            magnitude,
            phase,
            frequency,
            period,
            growth_rate,
            half_life,
            stability: classify_eigenvalue(magnitude, 1e-6),
            amplitude: amplitudes[i].norm(),
        });
    }

    info
}

/// Analyze system stability.
pub fn stability(decomposition: &impl Decomposition, tol: f64) -> StabilityResult {
    let mode_stability: Vec<Stability> = decomposition
        .eigenvalues()
        .iter()
        .map(|lambda| classify_eigenvalue(lambda.norm(), tol))
        .collect();

    let spectral_radius = decomposition
        .eigenvalues()
        .iter()
        .map(|lambda| lambda.norm())
        .fold(0.0_f64, f64::max);

    let is_unstable = mode_stability.contains(&Stability::Growing);
    let is_marginal = mode_stability.contains(&Stability::Neutral);

    StabilityResult {
        is_stable: !is_unstable,
        is_unstable,
        is_marginal,
        spectral_radius,
        mode_stability,
    }
}

/// Extract the indices of the dominant modes.
pub fn dominant_modes(
    decomposition: &impl Decomposition,
    n: usize,
    criterion: DominantCriterion,
) -> Vec<usize> {
    let eigenvalues = decomposition.eigenvalues();
    let amplitudes = decomposition.amplitudes();
    let n = n.min(eigenvalues.len());

    let mut scored: Vec<(usize, f64)> = (0..eigenvalues.len())
        .map(|i| {
            let score = match criterion {
                DominantCriterion::Amplitude => amplitudes[i].norm(),
                DominantCriterion::Energy => amplitudes[i].norm() * eigenvalues[i].norm(),
                DominantCriterion::Stability => 1.0 / (1.0 + (eigenvalues[i].norm() - 1.0).abs()),
            };
            (i, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.iter().take(n).map(|(i, _)| *i).collect()
}

/// Predict future states by evolving the modes beyond the fitted window.
///
/// x(k) = Σᵢ φᵢ · bᵢ · λᵢᵏ for k starting right after the last fitted
/// snapshot. Computed through the public `modes` accessor, so a higher-order
/// decomposition predicts in the original space.
///
/// Returns a matrix (mode rows × n_ahead).
pub fn predict(decomposition: &impl Decomposition, n_ahead: usize) -> Result<Mat<f64>, DmdError> {
    if n_ahead == 0 {
        return Err(DmdError::Validation("n_ahead must be positive".into()));
    }

    let modes = decomposition.modes();
    let eigenvalues = decomposition.eigenvalues();
    let amplitudes = decomposition.amplitudes();
    let start = decomposition.snapshot_count();

    let mut predictions = Mat::<f64>::zeros(modes.len(), n_ahead);
    for k in 0..n_ahead {
        let step = (start + k) as f64;
        for (i, mode_row) in modes.iter().enumerate() {
            let mut val = C64::new(0.0, 0.0);
            for (j, phi) in mode_row.iter().enumerate() {
                val += phi * (amplitudes[j] * eigenvalues[j].powf(step));
            }
            predictions[(i, k)] = val.re;
        }
    }

    Ok(predictions)
}

/// Classify an eigenvalue by its magnitude relative to the unit circle.
fn classify_eigenvalue(magnitude: f64, tol: f64) -> Stability {
    if magnitude < 1.0 - tol {
        Stability::Decaying
    } else if magnitude > 1.0 + tol {
        Stability::Growing
    } else {
        Stability::Neutral
    }
}
