// 🚩 Claims Spike Flagger
// Applies the ratio threshold to aggregator output. Division by zero never
// happens: zero-prior windows follow an explicit policy instead.

use crate::model::{CostWindow, SpikeFlag};
use std::collections::HashSet;

pub struct SpikeFlagger {
    /// Flag when current_cost / prior_cost strictly exceeds this
    /// (default: 3.0, i.e. more than a 200% increase).
    pub ratio_threshold: f64,

    /// pct_change assigned when prior is zero but current is positive
    /// (default: 999.0).
    pub sentinel_pct: f64,
}

impl SpikeFlagger {
    pub fn new() -> Self {
        SpikeFlagger {
            ratio_threshold: 3.0,
            sentinel_pct: 999.0,
        }
    }

    pub fn with_ratio(ratio_threshold: f64) -> Self {
        SpikeFlagger {
            ratio_threshold,
            sentinel_pct: 999.0,
        }
    }

    /// Percentage change under the zero-prior policy:
    /// - prior == 0, current > 0: the sentinel (an unbounded spike)
    /// - prior == 0, current == 0: 0.0
    /// - otherwise: (current - prior) / prior * 100
    pub fn pct_change(&self, prior_cost: f64, current_cost: f64) -> f64 {
        if prior_cost == 0.0 {
            if current_cost > 0.0 {
                self.sentinel_pct
            } else {
                0.0
            }
        } else {
            (current_cost - prior_cost) / prior_cost * 100.0
        }
    }

    fn is_spike(&self, prior_cost: f64, current_cost: f64) -> bool {
        (prior_cost == 0.0 && current_cost > 0.0)
            || (prior_cost > 0.0 && current_cost / prior_cost > self.ratio_threshold)
    }

    /// Retain the windows crossing the threshold, deduplicated by
    /// (company_id, window_start, window_end) and ordered by company then
    /// window_start.
    pub fn flag(&self, windows: &[CostWindow]) -> Vec<SpikeFlag> {
        let mut seen = HashSet::new();
        let mut flags: Vec<SpikeFlag> = windows
            .iter()
            .filter(|w| self.is_spike(w.prior_cost, w.current_cost))
            .filter(|w| {
                seen.insert((
                    w.company_id.clone(),
                    w.window_start,
                    w.window_end,
                ))
            })
            .map(|w| SpikeFlag {
                company_id: w.company_id.clone(),
                window_start: w.window_start,
                window_end: w.window_end,
                prior_cost: w.prior_cost,
                current_cost: w.current_cost,
                pct_change: self.pct_change(w.prior_cost, w.current_cost),
            })
            .collect();
        flags.sort_by(|a, b| {
            a.company_id
                .cmp(&b.company_id)
                .then(a.window_start.cmp(&b.window_start))
        });
        flags
    }
}

impl Default for SpikeFlagger {
    fn default() -> Self {
        Self::new()
    }
}
