// 🧩 Plan Interval Merger
// Collapses a company's plan intervals into maximal continuous coverage
// spans per plan type. A distance of 0 or 1 day between one interval's end
// and the next's start counts as contiguous (adjacent = no gap days);
// only a distance of more than 1 day opens a new span.

use crate::model::{MergedSpan, PlanInterval};
use std::collections::BTreeMap;

/// Group intervals by (company_id, plan_type), each group sorted by
/// (start_date, end_date) ascending. Carrier identity rides along
/// untouched; the gap detector depends on it.
pub fn group_intervals(
    intervals: &[PlanInterval],
) -> BTreeMap<(String, String), Vec<PlanInterval>> {
    let mut groups: BTreeMap<(String, String), Vec<PlanInterval>> = BTreeMap::new();
    for interval in intervals {
        groups
            .entry((interval.company_id.clone(), interval.plan_type.clone()))
            .or_default()
            .push(interval.clone());
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then(a.end_date.cmp(&b.end_date))
        });
    }
    groups
}

/// Merge one already-grouped set of intervals into continuous spans.
/// The input need not be sorted; a single interval yields a single span.
pub fn merge_group(intervals: &[PlanInterval]) -> Vec<MergedSpan> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then(a.end_date.cmp(&b.end_date))
    });

    let mut iter = sorted.into_iter();
    let first = match iter.next() {
        Some(interval) => interval,
        None => return Vec::new(),
    };

    let mut spans = Vec::new();
    let mut open = MergedSpan {
        company_id: first.company_id,
        plan_type: first.plan_type,
        start_date: first.start_date,
        end_date: first.end_date,
    };

    for interval in iter {
        let distance = (interval.start_date - open.end_date).num_days();
        if distance > 1 {
            spans.push(open);
            open = MergedSpan {
                company_id: interval.company_id,
                plan_type: interval.plan_type,
                start_date: interval.start_date,
                end_date: interval.end_date,
            };
        } else if interval.end_date > open.end_date {
            open.end_date = interval.end_date;
        }
    }
    spans.push(open);
    spans
}

/// Merge every (company_id, plan_type) group, spans ordered by company,
/// plan type, then start_date.
pub fn merge_all(intervals: &[PlanInterval]) -> Vec<MergedSpan> {
    group_intervals(intervals)
        .values()
        .flat_map(|group| merge_group(group))
        .collect()
}
