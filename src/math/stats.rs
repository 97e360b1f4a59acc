//! Small statistics helpers shared by the differencing test and the ARIMA fitter.

use nalgebra::{DMatrix, Schur};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::CoreError;

pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Biased sample autocovariance at `lag` of an already centered series.
pub fn autocovariance(centered: &[f64], lag: usize) -> f64 {
    let n = centered.len();
    if lag >= n {
        return 0.0;
    }
    let sum: f64 = (lag..n).map(|t| centered[t] * centered[t - lag]).sum();
    sum / n as f64
}

/// First difference applied `order` times.
pub fn difference(x: &[f64], order: usize) -> Vec<f64> {
    let mut out = x.to_vec();
    for _ in 0..order {
        out = out.windows(2).map(|w| w[1] - w[0]).collect();
    }
    out
}

/// Two-sided standard-normal quantile for a confidence level (0.95 -> 1.959964).
pub fn normal_quantile(confidence: f64) -> Result<f64, CoreError> {
    if !(confidence.is_finite() && confidence > 0.0 && confidence < 1.0) {
        return Err(CoreError::InvalidConfig(format!(
            "confidence must be in (0, 1), got {confidence}"
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| CoreError::ModelFit(format!("Normal distribution error: {e}")))?;
    Ok(normal.inverse_cdf(0.5 + confidence / 2.0))
}

/// Iteration cap for the Schur decomposition; nilpotent companion matrices
/// never converge without one.
const SCHUR_MAX_NITER: usize = 500;

/// Largest eigenvalue modulus of the companion matrix whose first row is `coeffs`.
///
/// For `x_t = Σ a_i x_{t-i}` this is < 1 iff the recursion is stable, i.e. the
/// polynomial `1 - Σ a_i z^i` has all roots outside the unit circle.
///
/// Trailing zero coefficients only add zero eigenvalues and are dropped first.
/// Returns `None` when the eigenvalue iteration does not converge.
pub fn companion_spectral_radius(coeffs: &[f64]) -> Option<f64> {
    let k = coeffs.iter().rposition(|&c| c != 0.0).map_or(0, |i| i + 1);
    let coeffs = &coeffs[..k];
    match k {
        0 => Some(0.0),
        1 => Some(coeffs[0].abs()),
        _ => {
            let mut m = DMatrix::<f64>::zeros(k, k);
            for (j, &c) in coeffs.iter().enumerate() {
                m[(0, j)] = c;
            }
            for i in 1..k {
                m[(i, i - 1)] = 1.0;
            }
            let schur = Schur::try_new(m, f64::EPSILON, SCHUR_MAX_NITER)?;
            let radius = schur
                .complex_eigenvalues()
                .iter()
                .map(|z| z.norm())
                .fold(0.0, f64::max);
            radius.is_finite().then_some(radius)
        }
    }
}
