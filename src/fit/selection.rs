//! Automatic ARIMA order selection.
//!
//! 1. choose `d` with the KPSS test (`differencing::choose_d`)
//! 2. fit candidate `(p, q)` orders (in parallel within one round)
//! 3. keep the candidate with the lowest information criterion
//!
//! Ties are broken deterministically: fewer parameters, then lower `p`, then
//! lower `q`. ARIMA(0, d, 0) is always among the first candidates, so any
//! series with at least two points yields a model.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{ArimaOrder, SearchConfig, SearchMode};
use crate::error::CoreError;
use crate::fit::differencing::choose_d;
use crate::fit::order_grid::{neighbours, order_grid, stepwise_seeds, OrderBounds};
use crate::models::ArimaFit;

/// Upper bound on stepwise rounds (each round moves to a strictly better model,
/// so this only guards against pathological inputs).
const MAX_STEPWISE_ROUNDS: usize = 64;

/// Grid candidates evaluated between two time-budget checks.
const GRID_CHUNK: usize = 8;

/// A fitted candidate with its criterion value.
#[derive(Debug, Clone)]
pub struct ScoredFit {
    pub fit: ArimaFit,
    pub score: f64,
}

/// Output of the order search.
#[derive(Debug, Clone)]
pub struct ArimaSelection {
    pub best: ScoredFit,
    /// Every order that was fitted successfully, with its score.
    pub evaluated: Vec<(ArimaOrder, f64)>,
    /// True when the time budget cut the search short.
    pub truncated: bool,
}

/// Select and fit an ARIMA model for `y`.
pub fn auto_arima(y: &[f64], config: &SearchConfig) -> Result<ArimaSelection, CoreError> {
    if y.len() < 2 {
        return Err(CoreError::InsufficientData {
            required: 2,
            actual: y.len(),
        });
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(CoreError::InvalidRecord(
            "series contains non-finite values".to_string(),
        ));
    }

    let d = choose_d(y, config.max_d);
    let with_intercept = d < 2;
    let bounds = OrderBounds::for_series(config, y.len() - d);
    let search = Search {
        y,
        d,
        with_intercept,
        cond_start: bounds.max_p,
        config,
        deadline: config.time_budget.map(|b| Instant::now() + b),
    };

    let mut state = SearchState::default();
    match config.mode {
        SearchMode::Grid => search.run_grid(&bounds, &mut state),
        SearchMode::Stepwise => search.run_stepwise(&bounds, &mut state),
    }

    let SearchState {
        best,
        evaluated,
        truncated,
        ..
    } = state;

    let Some(best) = best else {
        return Err(CoreError::ModelFit(format!(
            "no ARIMA candidate could be estimated (n={}, d={d})",
            y.len()
        )));
    };

    if truncated {
        warn!(
            order = %best.fit.order,
            evaluated = evaluated.len(),
            "order search stopped by time budget; using best model so far"
        );
    }
    info!(
        order = %best.fit.order,
        criterion = config.criterion.display_name(),
        score = best.score,
        evaluated = evaluated.len(),
        "selected model"
    );

    Ok(ArimaSelection {
        best,
        evaluated,
        truncated,
    })
}

#[derive(Default)]
struct SearchState {
    best: Option<ScoredFit>,
    evaluated: Vec<(ArimaOrder, f64)>,
    visited: HashSet<(usize, usize)>,
    truncated: bool,
}

impl SearchState {
    /// Record a round of fits; returns true if the incumbent improved.
    fn absorb(&mut self, fits: Vec<ScoredFit>) -> bool {
        let mut improved = false;
        for f in fits {
            self.evaluated.push((f.fit.order, f.score));
            let better = match &self.best {
                None => true,
                Some(cur) => compare(&f, cur) == Ordering::Less,
            };
            if better {
                self.best = Some(f);
                improved = true;
            }
        }
        improved
    }
}

struct Search<'a> {
    y: &'a [f64],
    d: usize,
    with_intercept: bool,
    cond_start: usize,
    config: &'a SearchConfig,
    deadline: Option<Instant>,
}

impl Search<'_> {
    fn out_of_time(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fit one batch of orders in parallel. Output order follows input order.
    fn evaluate(&self, orders: &[(usize, usize)], state: &mut SearchState) -> Vec<ScoredFit> {
        state.visited.extend(orders.iter().copied());
        orders
            .par_iter()
            .filter_map(|&(p, q)| {
                let order = ArimaOrder::new(p, self.d, q);
                let fit = ArimaFit::estimate(self.y, order, self.with_intercept, self.cond_start)?;
                let score = fit.criterion(self.config.criterion);
                debug!(%order, score, sigma2 = fit.sigma2, "candidate");
                Some(ScoredFit { fit, score })
            })
            .collect()
    }

    fn run_grid(&self, bounds: &OrderBounds, state: &mut SearchState) {
        let grid = order_grid(bounds);
        for (i, chunk) in grid.chunks(GRID_CHUNK).enumerate() {
            if i > 0 && self.out_of_time() {
                state.truncated = true;
                break;
            }
            let fits = self.evaluate(chunk, state);
            state.absorb(fits);
        }
    }

    fn run_stepwise(&self, bounds: &OrderBounds, state: &mut SearchState) {
        let seeds = stepwise_seeds(bounds);
        let fits = self.evaluate(&seeds, state);
        state.absorb(fits);

        for _ in 0..MAX_STEPWISE_ROUNDS {
            let Some((p, q)) = state.best.as_ref().map(|b| (b.fit.order.p, b.fit.order.q)) else {
                break;
            };
            let next: Vec<(usize, usize)> = neighbours(p, q, bounds)
                .into_iter()
                .filter(|pq| !state.visited.contains(pq))
                .collect();
            if next.is_empty() {
                break;
            }
            if self.out_of_time() {
                state.truncated = true;
                break;
            }
            let fits = self.evaluate(&next, state);
            if !state.absorb(fits) {
                break;
            }
        }
    }
}

fn compare(a: &ScoredFit, b: &ScoredFit) -> Ordering {
    let key = |s: &ScoredFit| {
        let o = s.fit.order;
        (o.p + o.q, o.p, o.q)
    };
    a.score.total_cmp(&b.score).then_with(|| key(a).cmp(&key(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Criterion;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal;
    use std::time::Duration;

    fn ar1(phi: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut prev = 0.0;
        (0..n)
            .map(|_| {
                prev = phi * prev + noise.sample(&mut rng);
                prev + 10.0
            })
            .collect()
    }

    #[test]
    fn single_point_is_insufficient() {
        let err = auto_arima(&[1.0], &SearchConfig::default()).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientData {
                required: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn two_points_still_produce_a_model() {
        let sel = auto_arima(&[1.0, 2.0], &SearchConfig::default()).unwrap();
        assert_eq!(sel.best.fit.order, ArimaOrder::new(0, 0, 0));
    }

    #[test]
    fn strong_ar1_selects_autoregressive_term() {
        let y = ar1(0.8, 300, 21);
        let sel = auto_arima(&y, &SearchConfig::default()).unwrap();
        let order = sel.best.fit.order;
        assert!(order.p >= 1 || order.d >= 1, "selected {order}");
    }

    #[test]
    fn grid_and_stepwise_agree_on_constant_series() {
        let y = vec![2.5; 12];
        for mode in [SearchMode::Grid, SearchMode::Stepwise] {
            let config = SearchConfig {
                mode,
                ..SearchConfig::default()
            };
            let sel = auto_arima(&y, &config).unwrap();
            assert_eq!(sel.best.fit.order, ArimaOrder::new(0, 0, 0));
        }
    }

    #[test]
    fn grid_never_scores_worse_than_stepwise() {
        let y = ar1(0.5, 80, 4);
        let grid = auto_arima(
            &y,
            &SearchConfig {
                mode: SearchMode::Grid,
                criterion: Criterion::Bic,
                ..SearchConfig::default()
            },
        )
        .unwrap();
        let step = auto_arima(
            &y,
            &SearchConfig {
                mode: SearchMode::Stepwise,
                criterion: Criterion::Bic,
                ..SearchConfig::default()
            },
        )
        .unwrap();
        assert!(grid.best.score <= step.best.score + 1e-9);
        assert!(grid.evaluated.len() >= step.evaluated.len());
    }

    #[test]
    fn zero_time_budget_keeps_first_round() {
        let y = ar1(0.5, 60, 9);
        let config = SearchConfig {
            time_budget: Some(Duration::ZERO),
            ..SearchConfig::default()
        };
        let sel = auto_arima(&y, &config).unwrap();
        assert!(sel.truncated);
        assert!(!sel.evaluated.is_empty());
    }
}
