// 📋 Core Record Types
// Everything the pipeline produces is created fresh per run from raw input;
// none of these persist across runs except the high-water-mark checkpoint.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// PLAN COVERAGE
// ============================================================================

/// One benefit plan interval as loaded from the plans file.
/// Grouped by (company_id, plan_type); end_date >= start_date or the record
/// is malformed and never reaches the merger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInterval {
    pub company_id: String,
    pub plan_type: String,
    pub carrier_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Maximal continuous coverage span derived by the merger.
///
/// Within one (company_id, plan_type) group: spans are non-overlapping,
/// sorted by start_date, and any two spans are separated by at least 2
/// calendar days (a 0- or 1-day distance would have been merged).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedSpan {
    pub company_id: String,
    pub plan_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A coverage lapse longer than the configured threshold.
///
/// Carrier attribution comes from the *unmerged* interval ordering: the
/// report names the actual carrier whose coverage ended/began, which the
/// merge discards when overlapping carriers coincide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub company_id: String,
    pub plan_type: String,
    pub gap_start: NaiveDate,
    pub gap_end: NaiveDate,
    /// Inclusive day count of [gap_start, gap_end].
    pub gap_length_days: i64,
    pub previous_carrier: String,
    pub next_carrier: String,
}

// ============================================================================
// CLAIMS
// ============================================================================

/// One insurance claim event. Amounts are non-negative; missing amounts
/// coalesce to zero upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimEvent {
    pub company_id: String,
    pub service_date: NaiveDate,
    pub amount: f64,
}

/// Rolling cost window anchored at one distinct service_date per company.
///
/// prior_cost covers [anchor-W, anchor-1]; current_cost covers
/// [anchor-W+1, anchor]. The two windows overlap but are distinct on
/// purpose: prior excludes the anchor day, current includes it and reaches
/// one day less far back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostWindow {
    pub company_id: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub prior_cost: f64,
    pub current_cost: f64,
}

/// A CostWindow retained because it crossed the spike threshold, with the
/// percentage change filled in by the flagger's division policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeFlag {
    pub company_id: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub prior_cost: f64,
    pub current_cost: f64,
    pub pct_change: f64,
}

// ============================================================================
// EMPLOYEES
// ============================================================================

/// Cleaned, enriched employee record (one row of the clean dataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    pub full_name: Option<String>,
    pub email: String,
    pub email_domain: Option<String>,
    pub title: Option<String>,
    pub company_ein: Option<String>,
    pub start_date: Option<NaiveDate>,
    /// Structured key:value pairs parsed out of the free-text notes column.
    pub notes_parsed: BTreeMap<String, String>,

    // Firmographic enrichment (looked up by email domain)
    pub industry: Option<String>,
    pub revenue: Option<f64>,
    pub headcount: Option<i64>,
}

/// Firmographic info served by the enrichment lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentInfo {
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub headcount: Option<i64>,
    #[serde(default)]
    pub domain: Option<String>,
}

// ============================================================================
// VALIDATION
// ============================================================================

/// One row of validation_errors.csv.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub row_id: String,
    pub field: String,
    pub reason: String,
}

impl ValidationIssue {
    pub fn new(row_id: impl Into<String>, field: &str, reason: impl Into<String>) -> Self {
        ValidationIssue {
            row_id: row_id.into(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.row_id, self.field, self.reason)
    }
}

/// Outcome of validating one raw row. Rows either survive as a typed record
/// or carry the reason they were rejected; there is no shared error
/// accumulator.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    Valid(T),
    Rejected(ValidationIssue),
}

impl<T> RowOutcome<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, RowOutcome::Valid(_))
    }
}

/// Split outcomes into the clean records and the rejection report,
/// preserving input order on both sides.
pub fn partition_outcomes<T>(outcomes: Vec<RowOutcome<T>>) -> (Vec<T>, Vec<ValidationIssue>) {
    let mut valid = Vec::new();
    let mut rejected = Vec::new();
    for outcome in outcomes {
        match outcome {
            RowOutcome::Valid(record) => valid.push(record),
            RowOutcome::Rejected(issue) => rejected.push(issue),
        }
    }
    (valid, rejected)
}

// ============================================================================
// ROSTER
// ============================================================================

/// How far off the observed headcount is from the configured expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterSeverity {
    /// No expected headcount on file for this company
    Unknown,
    /// Off by less than 20% of expected
    Low,
    /// Off by less than 50% of expected
    Medium,
    /// Off by up to 100% of expected
    High,
    /// Off by more than 100% of expected
    Critical,
}

impl RosterSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            RosterSeverity::Unknown => "Unknown",
            RosterSeverity::Low => "Low",
            RosterSeverity::Medium => "Medium",
            RosterSeverity::High => "High",
            RosterSeverity::Critical => "Critical",
        }
    }
}

/// One row of the roster mismatch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterRow {
    pub company_id: String,
    pub expected: i64,
    pub observed: i64,
    /// Absolute headcount difference as a percentage of expected, rounded
    /// to 2 decimals. None when expected is zero.
    pub pct_diff: Option<f64>,
    pub severity: RosterSeverity,
}
