//! ARIMA(p, d, q) estimation and forecasting.
//!
//! The series is differenced `d` times, then
//!
//! ```text
//! x_t = c + Σ φ_i x_{t-i} + Σ θ_j e_{t-j} + e_t
//! ```
//!
//! is estimated by conditional least squares (Hannan–Rissanen):
//!
//! 1. a long autoregression gives innovation estimates `ê_t` (only when `q > 0`)
//! 2. `x_t` is regressed on its own lags and on lagged `ê_t`
//! 3. residuals are recomputed recursively with the final coefficients
//!
//! Both regressions are solved with `math::solve_least_squares`, so a
//! candidate costs a couple of tiny SVDs. Candidates that cannot be estimated
//! (too few rows, non-stationary AR, non-invertible MA) return `None`; the
//! order search simply skips them.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{ArimaOrder, Criterion};
use crate::math::{companion_spectral_radius, difference, solve_least_squares};

/// Roots closer to the unit circle than this are treated as unit roots.
const UNIT_ROOT_TOL: f64 = 1e-6;

/// Floor for the innovation variance inside the log-likelihood (exact fits).
const SIGMA2_FLOOR: f64 = 1e-12;

/// A fitted ARIMA model (kept only for the duration of one request).
#[derive(Debug, Clone)]
pub struct ArimaFit {
    pub order: ArimaOrder,
    pub with_intercept: bool,
    pub intercept: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    /// Innovation variance (MLE, `SSE / n_eff`).
    pub sigma2: f64,
    /// Observations contributing to the conditional likelihood.
    pub n_eff: usize,
    pub log_likelihood: f64,
    diffed: Vec<f64>,
    residuals: Vec<f64>,
    /// Last value of `diff^k(y)` for `k = 0..d`, used to integrate forecasts.
    tails: Vec<f64>,
}

/// Point forecasts and their standard errors, in the units of the fitted series.
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaForecast {
    pub mean: Vec<f64>,
    pub std_err: Vec<f64>,
}

impl ArimaFit {
    /// Estimate an ARIMA model on `y`.
    ///
    /// `cond_start` is the first index of the differenced series that enters
    /// the likelihood; using the same value for every candidate keeps their
    /// information criteria comparable.
    pub fn estimate(
        y: &[f64],
        order: ArimaOrder,
        with_intercept: bool,
        cond_start: usize,
    ) -> Option<Self> {
        let ArimaOrder { p, d, q } = order;
        if y.len() <= d {
            return None;
        }

        let x = difference(y, d);
        let m = x.len();
        let cond = cond_start.max(p);
        let k = p + q + usize::from(with_intercept);
        if cond >= m || m - cond < k + 1 {
            debug!(%order, m, k, "candidate skipped: too few observations");
            return None;
        }

        let (innovations, first_innovation) = if q > 0 {
            long_ar_innovations(&x, p, q)?
        } else {
            (vec![0.0; m], 0)
        };

        // Stage 2: regress x_t on [1, x_{t-1..p}, ê_{t-1..q}].
        let start = p.max(first_innovation + q);
        if start >= m || m - start < k + 1 {
            debug!(%order, m, start, "candidate skipped: too few regression rows");
            return None;
        }

        let rows = m - start;
        let mut design = DMatrix::<f64>::zeros(rows, k);
        let mut target = DVector::<f64>::zeros(rows);
        for (r, t) in (start..m).enumerate() {
            let mut col = 0;
            if with_intercept {
                design[(r, col)] = 1.0;
                col += 1;
            }
            for i in 1..=p {
                design[(r, col)] = x[t - i];
                col += 1;
            }
            for j in 1..=q {
                design[(r, col)] = innovations[t - j];
                col += 1;
            }
            target[r] = x[t];
        }

        let beta = solve_least_squares(&design, &target)?;
        let offset = usize::from(with_intercept);
        let intercept = if with_intercept { beta[0] } else { 0.0 };
        let ar: Vec<f64> = (0..p).map(|i| beta[offset + i]).collect();
        let ma: Vec<f64> = (0..q).map(|j| beta[offset + p + j]).collect();

        if !is_stable(&ar) {
            debug!(%order, "candidate rejected: non-stationary AR part");
            return None;
        }
        let neg_ma: Vec<f64> = ma.iter().map(|t| -t).collect();
        if !is_stable(&neg_ma) {
            debug!(%order, "candidate rejected: non-invertible MA part");
            return None;
        }

        let residuals = css_residuals(&x, intercept, &ar, &ma);
        let sse: f64 = residuals[cond..].iter().map(|e| e * e).sum();
        if !sse.is_finite() {
            debug!(%order, "candidate rejected: non-finite residuals");
            return None;
        }

        let n_eff = m - cond;
        let sigma2 = sse / n_eff as f64;
        let log_likelihood = concentrated_log_likelihood(sigma2, n_eff);

        let tails = (0..d)
            .filter_map(|level| difference(y, level).last().copied())
            .collect();

        Some(Self {
            order,
            with_intercept,
            intercept,
            ar,
            ma,
            sigma2,
            n_eff,
            log_likelihood,
            diffed: x,
            residuals,
            tails,
        })
    }

    /// Number of estimated parameters, including the innovation variance.
    pub fn param_count(&self) -> usize {
        self.order.p + self.order.q + usize::from(self.with_intercept) + 1
    }

    /// Value of an information criterion (lower is better).
    pub fn criterion(&self, criterion: Criterion) -> f64 {
        let n = self.n_eff as f64;
        let k = self.param_count() as f64;
        let aic = -2.0 * self.log_likelihood + 2.0 * k;
        match criterion {
            Criterion::Aic => aic,
            Criterion::Aicc => {
                let denom = n - k - 1.0;
                if denom > 0.0 {
                    aic + 2.0 * k * (k + 1.0) / denom
                } else {
                    f64::INFINITY
                }
            }
            Criterion::Bic => -2.0 * self.log_likelihood + k * n.ln(),
        }
    }

    /// Forecast `horizon` steps ahead on the original (undifferenced) scale.
    pub fn forecast(&self, horizon: usize) -> ArimaForecast {
        let m = self.diffed.len();
        let mut xs = self.diffed.clone();
        let mut es = self.residuals.clone();

        for _ in 0..horizon {
            let t = xs.len();
            let mut pred = self.intercept;
            for (i, phi) in self.ar.iter().enumerate() {
                pred += phi * xs[t - i - 1];
            }
            for (j, theta) in self.ma.iter().enumerate() {
                pred += theta * es[t - j - 1];
            }
            xs.push(pred);
            es.push(0.0);
        }

        let mut mean = xs[m..].to_vec();
        for level in (0..self.order.d).rev() {
            let mut acc = self.tails[level];
            mean = mean
                .into_iter()
                .map(|v| {
                    acc += v;
                    acc
                })
                .collect();
        }

        let psi = psi_weights(&self.ar, &self.ma, self.order.d, horizon);
        let mut cum = 0.0;
        let std_err = psi
            .iter()
            .map(|w| {
                cum += w * w;
                (self.sigma2 * cum).sqrt()
            })
            .collect();

        ArimaForecast { mean, std_err }
    }
}

/// Innovation estimates from a long autoregression (stage 1 of Hannan–Rissanen).
///
/// Returns the estimates and the first index where they are defined; earlier
/// entries are zero.
fn long_ar_innovations(x: &[f64], p: usize, q: usize) -> Option<(Vec<f64>, usize)> {
    let m = x.len();
    let long = (p.max(q) + 2).min(m.saturating_sub(2) / 2);
    if long == 0 {
        return None;
    }

    let rows = m - long;
    let cols = long + 1;
    if rows <= cols {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(rows, cols);
    let mut target = DVector::<f64>::zeros(rows);
    for (r, t) in (long..m).enumerate() {
        design[(r, 0)] = 1.0;
        for i in 1..=long {
            design[(r, i)] = x[t - i];
        }
        target[r] = x[t];
    }

    let beta = solve_least_squares(&design, &target)?;
    let fitted = &design * &beta;

    let mut out = vec![0.0; m];
    for (r, t) in (long..m).enumerate() {
        out[t] = x[t] - fitted[r];
    }
    Some((out, long))
}

/// Roots of `1 - Σ c_i z^i` strictly outside the unit circle (with tolerance).
/// A companion matrix whose eigenvalues cannot be computed counts as unstable.
fn is_stable(coeffs: &[f64]) -> bool {
    companion_spectral_radius(coeffs).is_some_and(|r| r < 1.0 - UNIT_ROOT_TOL)
}

/// Conditional residuals: `e_t = 0` for `t < p`, then the ARMA recursion.
fn css_residuals(x: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut e = vec![0.0; x.len()];
    for t in p..x.len() {
        let mut pred = intercept;
        for (i, phi) in ar.iter().enumerate() {
            pred += phi * x[t - i - 1];
        }
        for (j, theta) in ma.iter().enumerate() {
            if t > j {
                pred += theta * e[t - j - 1];
            }
        }
        e[t] = x[t] - pred;
    }
    e
}

fn concentrated_log_likelihood(sigma2: f64, n_eff: usize) -> f64 {
    let n = n_eff as f64;
    let s2 = sigma2.max(SIGMA2_FLOOR);
    -0.5 * n * ((2.0 * std::f64::consts::PI * s2).ln() + 1.0)
}

/// MA(∞) weights `ψ_0..ψ_{h-1}` of `φ(B)(1-B)^d x_t = θ(B) e_t`.
pub fn psi_weights(ar: &[f64], ma: &[f64], d: usize, horizon: usize) -> Vec<f64> {
    // Coefficients of φ(B)(1-B)^d, constant term first.
    let mut poly = Vec::with_capacity(ar.len() + 1);
    poly.push(1.0);
    poly.extend(ar.iter().map(|a| -a));
    for _ in 0..d {
        let mut next = vec![0.0; poly.len() + 1];
        for (i, &c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        poly = next;
    }
    let phi_star: Vec<f64> = poly[1..].iter().map(|c| -c).collect();

    let mut psi = Vec::with_capacity(horizon);
    for j in 0..horizon {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut w = ma.get(j - 1).copied().unwrap_or(0.0);
        for (i, phi) in phi_star.iter().enumerate().take(j) {
            w += phi * psi[j - i - 1];
        }
        psi.push(w);
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal;

    fn ar1_series(phi: f64, c: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 0.1).unwrap();
        let mut x = Vec::with_capacity(n);
        let mut prev = c / (1.0 - phi);
        for _ in 0..n {
            let v = c + phi * prev + noise.sample(&mut rng);
            x.push(v);
            prev = v;
        }
        x
    }

    #[test]
    fn psi_weights_of_random_walk_are_ones() {
        let psi = psi_weights(&[], &[], 1, 4);
        assert_eq!(psi, vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn psi_weights_of_ar1_decay_geometrically() {
        let psi = psi_weights(&[0.5], &[], 0, 3);
        assert_eq!(psi, vec![1.0, 0.5, 0.25]);
    }

    #[test]
    fn psi_weights_of_ma1() {
        let psi = psi_weights(&[], &[0.4], 0, 3);
        assert_eq!(psi, vec![1.0, 0.4, 0.0]);
    }

    #[test]
    fn ar1_coefficient_is_recovered() {
        let x = ar1_series(0.6, 1.0, 400, 7);
        let fit = ArimaFit::estimate(&x, ArimaOrder::new(1, 0, 0), true, 1).unwrap();
        assert!((fit.ar[0] - 0.6).abs() < 0.15, "phi={}", fit.ar[0]);
        assert!(fit.sigma2 > 0.0);
    }

    #[test]
    fn mean_model_forecasts_the_mean() {
        let y = [1.0, 3.0, 1.0, 3.0];
        let fit = ArimaFit::estimate(&y, ArimaOrder::new(0, 0, 0), true, 0).unwrap();
        let fc = fit.forecast(3);
        for v in &fc.mean {
            assert!((v - 2.0).abs() < 1e-9);
        }
        // sigma2 = 1, constant standard error
        for s in &fc.std_err {
            assert!((s - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn drift_model_extends_linear_trend() {
        let y = [10.0, 12.0, 14.0, 16.0];
        let fit = ArimaFit::estimate(&y, ArimaOrder::new(0, 1, 0), true, 0).unwrap();
        let fc = fit.forecast(3);
        assert!((fc.mean[0] - 18.0).abs() < 1e-9);
        assert!((fc.mean[2] - 22.0).abs() < 1e-9);
    }

    #[test]
    fn second_difference_integrates_twice() {
        let y = [1.0, 4.0, 9.0, 16.0, 25.0];
        let fit = ArimaFit::estimate(&y, ArimaOrder::new(0, 2, 0), false, 0).unwrap();
        // No intercept: second difference forecast is 0, so the series
        // continues with its last slope (9).
        let fc = fit.forecast(2);
        assert!((fc.mean[0] - 34.0).abs() < 1e-9);
        assert!((fc.mean[1] - 43.0).abs() < 1e-9);
    }

    #[test]
    fn too_short_series_is_not_estimable() {
        let y = [1.0, 2.0, 3.0];
        assert!(ArimaFit::estimate(&y, ArimaOrder::new(2, 0, 2), true, 2).is_none());
    }

    #[test]
    fn standard_errors_grow_with_horizon_for_random_walk() {
        let y = [1.0, 1.5, 1.2, 1.9, 2.4, 2.1];
        let fit = ArimaFit::estimate(&y, ArimaOrder::new(0, 1, 0), true, 0).unwrap();
        let fc = fit.forecast(3);
        assert!(fc.std_err[0] <= fc.std_err[1] && fc.std_err[1] <= fc.std_err[2]);
    }

    #[test]
    fn criteria_penalize_parameters() {
        let x = ar1_series(0.5, 0.5, 120, 3);
        let fit = ArimaFit::estimate(&x, ArimaOrder::new(1, 0, 0), true, 1).unwrap();
        let aic = fit.criterion(Criterion::Aic);
        let bic = fit.criterion(Criterion::Bic);
        let aicc = fit.criterion(Criterion::Aicc);
        assert!(bic > aic);
        assert!(aicc > aic);
    }
}
