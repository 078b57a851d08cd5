// 📈 Rolling Claims Aggregator
// For every distinct service_date per company (the anchor), two trailing
// cost sums over calendar-day windows:
//   prior_cost   over [anchor - W,     anchor - 1]
//   current_cost over [anchor - W + 1, anchor]
// The windows overlap but differ at both edges: prior excludes the anchor
// day, current includes it and reaches one day less far back. Days with no
// events contribute 0.

use crate::model::{ClaimEvent, CostWindow};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

pub struct RollingAggregator {
    /// Window length in calendar days (default: 90).
    pub window_days: i64,
}

impl RollingAggregator {
    pub fn new() -> Self {
        RollingAggregator { window_days: 90 }
    }

    pub fn with_window(window_days: i64) -> Self {
        RollingAggregator { window_days }
    }

    /// One CostWindow per distinct (company_id, service_date), ordered by
    /// company then anchor date.
    pub fn windows(&self, events: &[ClaimEvent]) -> Vec<CostWindow> {
        let mut by_company: BTreeMap<&str, Vec<&ClaimEvent>> = BTreeMap::new();
        for event in events {
            by_company
                .entry(event.company_id.as_str())
                .or_default()
                .push(event);
        }

        let mut windows = Vec::new();
        for (company_id, company_events) in by_company {
            let mut anchors: Vec<NaiveDate> =
                company_events.iter().map(|e| e.service_date).collect();
            anchors.sort();
            anchors.dedup();

            for anchor in anchors {
                windows.push(self.window_at(company_id, anchor, &company_events));
            }
        }
        windows
    }

    fn window_at(
        &self,
        company_id: &str,
        anchor: NaiveDate,
        events: &[&ClaimEvent],
    ) -> CostWindow {
        let prior_from = anchor - Duration::days(self.window_days);
        let prior_to = anchor - Duration::days(1);
        let current_from = anchor - Duration::days(self.window_days - 1);

        let mut prior_cost = 0.0;
        let mut current_cost = 0.0;
        for event in events {
            let day = event.service_date;
            if day >= prior_from && day <= prior_to {
                prior_cost += event.amount;
            }
            if day >= current_from && day <= anchor {
                current_cost += event.amount;
            }
        }

        CostWindow {
            company_id: company_id.to_string(),
            window_start: current_from,
            window_end: anchor,
            prior_cost,
            current_cost,
        }
    }
}

impl Default for RollingAggregator {
    fn default() -> Self {
        Self::new()
    }
}
