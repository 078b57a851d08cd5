// 👥 Roster Mismatch Report
// Compares observed headcount (distinct employees in the clean set) against
// the configured expected headcount per company, bucketing the deviation.

use crate::model::{Employee, RosterRow, RosterSeverity};
use std::collections::{BTreeMap, BTreeSet};

/// Expected headcount per company EIN, supplied by configuration.
pub type ExpectedHeadcounts = BTreeMap<String, i64>;

/// Build the roster report. Companies present on either side appear:
/// companies seen only in the data get expected = 0 (Unknown severity),
/// companies only in the expectation table get observed = 0.
pub fn roster_report(employees: &[Employee], expected: &ExpectedHeadcounts) -> Vec<RosterRow> {
    let mut observed: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for employee in employees {
        if let Some(ein) = &employee.company_ein {
            observed
                .entry(ein.clone())
                .or_default()
                .insert(employee.employee_id.as_str());
        }
    }

    let mut companies: BTreeSet<String> = observed.keys().cloned().collect();
    companies.extend(expected.keys().cloned());

    companies
        .into_iter()
        .map(|company_id| {
            let expected_count = expected.get(&company_id).copied().unwrap_or(0);
            let observed_count = observed
                .get(&company_id)
                .map(|ids| ids.len() as i64)
                .unwrap_or(0);
            let (pct_diff, severity) = score(expected_count, observed_count);
            RosterRow {
                company_id,
                expected: expected_count,
                observed: observed_count,
                pct_diff,
                severity,
            }
        })
        .collect()
}

fn score(expected: i64, observed: i64) -> (Option<f64>, RosterSeverity) {
    if expected == 0 {
        return (None, RosterSeverity::Unknown);
    }
    let diff = (observed - expected).abs() as f64;
    let expected_f = expected as f64;
    let pct = diff * 100.0 / expected_f;
    let pct = (pct * 100.0).round() / 100.0;

    let severity = if diff < 0.2 * expected_f {
        RosterSeverity::Low
    } else if diff < 0.5 * expected_f {
        RosterSeverity::Medium
    } else if diff <= 1.0 * expected_f {
        RosterSeverity::High
    } else {
        RosterSeverity::Critical
    };
    (Some(pct), severity)
}
