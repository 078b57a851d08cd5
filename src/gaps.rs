// 🔍 Coverage Gap Detector
// Walks the chronologically sorted *original* intervals per
// (company_id, plan_type) — not the merged spans. Carrier transitions
// inside overlapping coverage are not gaps, but the report must name the
// carrier whose coverage actually ended/began, and merging discards that
// identity when multiple carriers coincide.

use crate::merge::group_intervals;
use crate::model::{Gap, PlanInterval};
use chrono::Duration;

pub struct GapDetector {
    /// A lapse is only reported when the day distance between one
    /// interval's end and the next's start exceeds this (default: 7).
    pub min_gap_days: i64,
}

impl GapDetector {
    pub fn new() -> Self {
        GapDetector { min_gap_days: 7 }
    }

    pub fn with_threshold(min_gap_days: i64) -> Self {
        GapDetector { min_gap_days }
    }

    /// Detect gaps across all companies and plan types. Output is ordered
    /// by company, then gap_start ascending. Groups with at most one
    /// interval produce no gaps.
    pub fn detect(&self, intervals: &[PlanInterval]) -> Vec<Gap> {
        let mut gaps = Vec::new();
        for group in group_intervals(intervals).values() {
            self.detect_in_group(group, &mut gaps);
        }
        gaps.sort_by(|a, b| {
            a.company_id
                .cmp(&b.company_id)
                .then(a.gap_start.cmp(&b.gap_start))
        });
        gaps
    }

    /// Consecutive-pair walk over one sorted group.
    fn detect_in_group(&self, sorted: &[PlanInterval], gaps: &mut Vec<Gap>) {
        for pair in sorted.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            let delta_days = (current.start_date - previous.end_date).num_days();
            if delta_days > self.min_gap_days {
                let gap_start = previous.end_date + Duration::days(1);
                let gap_end = current.start_date - Duration::days(1);
                gaps.push(Gap {
                    company_id: current.company_id.clone(),
                    plan_type: current.plan_type.clone(),
                    gap_start,
                    gap_end,
                    // Inclusive day count of [gap_start, gap_end] == delta - 1.
                    gap_length_days: delta_days - 1,
                    previous_carrier: previous.carrier_name.clone(),
                    next_carrier: current.carrier_name.clone(),
                });
            }
        }
    }
}

impl Default for GapDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn interval(
        company: &str,
        plan: &str,
        carrier: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PlanInterval {
        PlanInterval {
            company_id: company.to_string(),
            plan_type: plan.to_string(),
            carrier_name: carrier.to_string(),
            start_date: start,
            end_date: end,
        }
    }

    #[test]
    fn test_dental_scenario() {
        let intervals = vec![
            interval("A", "Dental", "carrierX", date(2023, 1, 1), date(2023, 3, 31)),
            interval("A", "Dental", "carrierY", date(2023, 4, 10), date(2023, 6, 30)),
        ];

        let gaps = GapDetector::new().detect(&intervals);

        assert_eq!(gaps.len(), 1);
        let gap = &gaps[0];
        assert_eq!(gap.gap_start, date(2023, 4, 1));
        assert_eq!(gap.gap_end, date(2023, 4, 9));
        assert_eq!(gap.gap_length_days, 9);
        assert_eq!(gap.previous_carrier, "carrierX");
        assert_eq!(gap.next_carrier, "carrierY");
    }

    #[test]
    fn test_adjacent_intervals_no_gap() {
        let intervals = vec![
            interval("A", "Dental", "X", date(2023, 1, 1), date(2023, 3, 31)),
            interval("A", "Dental", "Y", date(2023, 4, 1), date(2023, 6, 30)),
        ];
        assert!(GapDetector::new().detect(&intervals).is_empty());
    }

    #[test]
    fn test_distance_at_threshold_not_reported() {
        // delta of exactly 7 days: strict '>' means no gap.
        let intervals = vec![
            interval("A", "Dental", "X", date(2023, 1, 1), date(2023, 3, 31)),
            interval("A", "Dental", "Y", date(2023, 4, 7), date(2023, 6, 30)),
        ];
        assert!(GapDetector::new().detect(&intervals).is_empty());

        // One more day and it is reported.
        let intervals = vec![
            interval("A", "Dental", "X", date(2023, 1, 1), date(2023, 3, 31)),
            interval("A", "Dental", "Y", date(2023, 4, 8), date(2023, 6, 30)),
        ];
        let gaps = GapDetector::new().detect(&intervals);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].gap_length_days, 7);
    }

    #[test]
    fn test_single_interval_group_no_gaps() {
        let intervals = vec![interval(
            "A",
            "Dental",
            "X",
            date(2023, 1, 1),
            date(2023, 3, 31),
        )];
        assert!(GapDetector::new().detect(&intervals).is_empty());
    }

    #[test]
    fn test_threshold_is_configurable_and_monotonic() {
        let intervals = vec![
            interval("A", "Dental", "X", date(2023, 1, 1), date(2023, 1, 31)),
            interval("A", "Dental", "Y", date(2023, 2, 5), date(2023, 2, 28)),
            interval("A", "Dental", "Z", date(2023, 3, 20), date(2023, 4, 30)),
        ];

        let mut previous_count = usize::MAX;
        for threshold in [1, 3, 5, 7, 14, 30] {
            let count = GapDetector::with_threshold(threshold)
                .detect(&intervals)
                .len();
            assert!(
                count <= previous_count,
                "raising the threshold ({} days) increased gaps",
                threshold
            );
            previous_count = count;
        }

        assert_eq!(GapDetector::with_threshold(3).detect(&intervals).len(), 2);
        assert_eq!(GapDetector::with_threshold(7).detect(&intervals).len(), 1);
    }

    #[test]
    fn test_carrier_identity_survives_sort() {
        // Inserted out of order; attribution must follow chronology.
        let intervals = vec![
            interval("A", "Medical", "late", date(2023, 6, 1), date(2023, 9, 30)),
            interval("A", "Medical", "early", date(2023, 1, 1), date(2023, 3, 31)),
        ];

        let gaps = GapDetector::new().detect(&intervals);

        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].previous_carrier, "early");
        assert_eq!(gaps[0].next_carrier, "late");
    }

    #[test]
    fn test_plan_types_do_not_cross() {
        // Medical ends in March, Dental starts in June: different groups,
        // no gap between them.
        let intervals = vec![
            interval("A", "Medical", "X", date(2023, 1, 1), date(2023, 3, 31)),
            interval("A", "Dental", "Y", date(2023, 6, 1), date(2023, 9, 30)),
        ];
        assert!(GapDetector::new().detect(&intervals).is_empty());
    }

    #[test]
    fn test_output_ordered_by_company_then_start() {
        let intervals = vec![
            interval("B", "Dental", "X", date(2023, 1, 1), date(2023, 1, 31)),
            interval("B", "Dental", "Y", date(2023, 3, 1), date(2023, 3, 31)),
            interval("A", "Dental", "X", date(2023, 5, 1), date(2023, 5, 31)),
            interval("A", "Dental", "Y", date(2023, 7, 1), date(2023, 7, 31)),
            interval("A", "Medical", "X", date(2023, 1, 1), date(2023, 1, 31)),
            interval("A", "Medical", "Y", date(2023, 3, 1), date(2023, 3, 31)),
        ];

        let gaps = GapDetector::new().detect(&intervals);

        assert_eq!(gaps.len(), 3);
        assert_eq!(gaps[0].company_id, "A");
        assert_eq!(gaps[0].gap_start, date(2023, 2, 1));
        assert_eq!(gaps[1].company_id, "A");
        assert_eq!(gaps[1].gap_start, date(2023, 6, 1));
        assert_eq!(gaps[2].company_id, "B");
    }
}
