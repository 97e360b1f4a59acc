//! Choosing the differencing order `d`.
//!
//! We follow the usual auto-ARIMA recipe: run a KPSS test for level
//! stationarity and difference the series while the test rejects, up to
//! `max_d` times.
//!
//! KPSS statistic:
//!
//! ```text
//! η = Σ S_t² / (n² · σ̂²_LR),   S_t = Σ_{i≤t} (x_i - x̄)
//! ```
//!
//! with a Newey–West (Bartlett) long-run variance and the short lag rule
//! `l = ⌊3√n / 13⌋`.

use tracing::debug;

use crate::math::{autocovariance, difference, mean};

/// 5% critical value of the KPSS level-stationarity test.
pub const KPSS_CRITICAL_5PCT: f64 = 0.463;

/// Series shorter than this are not tested (and not differenced).
const KPSS_MIN_LEN: usize = 4;

/// A differenced series must keep at least this many values.
const MIN_DIFFERENCED_LEN: usize = 3;

/// KPSS level-stationarity statistic. Constant series return `0.0`.
pub fn kpss_statistic(x: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return 0.0;
    }

    let mu = mean(x);
    let centered: Vec<f64> = x.iter().map(|v| v - mu).collect();

    let mut partial = 0.0;
    let mut eta = 0.0;
    for e in &centered {
        partial += e;
        eta += partial * partial;
    }

    let lags = ((3.0 * (n as f64).sqrt()) / 13.0).floor() as usize;
    let mut long_run = autocovariance(&centered, 0);
    for k in 1..=lags.min(n - 1) {
        let weight = 1.0 - k as f64 / (lags as f64 + 1.0);
        long_run += 2.0 * weight * autocovariance(&centered, k);
    }

    if !(long_run.is_finite() && long_run > 1e-14) {
        return 0.0;
    }

    eta / ((n * n) as f64 * long_run)
}

/// Pick `d ∈ 0..=max_d` for `y`.
pub fn choose_d(y: &[f64], max_d: usize) -> usize {
    let mut x = y.to_vec();
    let mut d = 0;

    while d < max_d && x.len() >= KPSS_MIN_LEN && x.len() > MIN_DIFFERENCED_LEN {
        let stat = kpss_statistic(&x);
        debug!(d, stat, "KPSS");
        if stat <= KPSS_CRITICAL_5PCT {
            break;
        }
        x = difference(&x, 1);
        d += 1;
    }

    d
}
