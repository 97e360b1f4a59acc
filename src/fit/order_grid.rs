//! Candidate `(p, q)` orders for the ARIMA search.
//!
//! - grid mode: every `(p, q)` inside the bounds
//! - stepwise mode: a few seed orders, then ±1 neighbours of the incumbent
//!
//! All generators are deterministic and return orders in a stable order.

use crate::domain::SearchConfig;

/// Bounds on the AR/MA orders, already clipped to what the series supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBounds {
    pub max_p: usize,
    pub max_q: usize,
    pub max_order: usize,
}

impl OrderBounds {
    /// Clip the configured bounds to a differenced series of length `m`.
    ///
    /// Each lag costs at least one regression row, and a few rows must remain
    /// to estimate the variance, so short series only see low orders.
    pub fn for_series(config: &SearchConfig, m: usize) -> Self {
        let room = m.saturating_sub(1) / 2;
        Self {
            max_p: config.max_p.min(room),
            max_q: config.max_q.min(room),
            max_order: config.max_order,
        }
    }

    pub fn contains(&self, p: usize, q: usize) -> bool {
        p <= self.max_p && q <= self.max_q && p + q <= self.max_order
    }
}

/// Full grid, simplest models first.
pub fn order_grid(bounds: &OrderBounds) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for p in 0..=bounds.max_p {
        for q in 0..=bounds.max_q {
            if bounds.contains(p, q) {
                out.push((p, q));
            }
        }
    }
    out.sort_by_key(|&(p, q)| (p + q, p, q));
    out
}

/// Seed orders of the stepwise search: (2,2), (0,0), (1,0), (0,1), clipped.
pub fn stepwise_seeds(bounds: &OrderBounds) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for (p, q) in [(2, 2), (0, 0), (1, 0), (0, 1)] {
        let pq = (p.min(bounds.max_p), q.min(bounds.max_q));
        if bounds.contains(pq.0, pq.1) && !out.contains(&pq) {
            out.push(pq);
        }
    }
    out
}

/// Neighbours of `(p, q)`: change p, q, or both by one.
pub fn neighbours(p: usize, q: usize, bounds: &OrderBounds) -> Vec<(usize, usize)> {
    let deltas: [(isize, isize); 8] = [
        (-1, 0),
        (1, 0),
        (0, -1),
        (0, 1),
        (-1, -1),
        (1, 1),
        (-1, 1),
        (1, -1),
    ];

    deltas
        .iter()
        .filter_map(|&(dp, dq)| {
            let np = p.checked_add_signed(dp)?;
            let nq = q.checked_add_signed(dq)?;
            bounds.contains(np, nq).then_some((np, nq))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(max_p: usize, max_q: usize, max_order: usize) -> OrderBounds {
        OrderBounds {
            max_p,
            max_q,
            max_order,
        }
    }

    #[test]
    fn grid_respects_total_order() {
        let grid = order_grid(&bounds(3, 3, 3));
        assert!(grid.iter().all(|&(p, q)| p + q <= 3));
        assert_eq!(grid[0], (0, 0));
        assert_eq!(grid.len(), 10);
    }

    #[test]
    fn seeds_are_clipped_and_deduplicated() {
        let seeds = stepwise_seeds(&bounds(0, 0, 5));
        assert_eq!(seeds, vec![(0, 0)]);

        let seeds = stepwise_seeds(&bounds(1, 1, 5));
        assert_eq!(seeds, vec![(1, 1), (0, 0), (1, 0), (0, 1)]);
    }

    #[test]
    fn neighbours_stay_in_bounds() {
        let n = neighbours(0, 0, &bounds(2, 2, 4));
        assert_eq!(n, vec![(1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn short_series_clip_orders() {
        let config = SearchConfig::default();
        let b = OrderBounds::for_series(&config, 2);
        assert_eq!((b.max_p, b.max_q), (0, 0));
        let b = OrderBounds::for_series(&config, 40);
        assert_eq!((b.max_p, b.max_q), (3, 3));
    }
}
