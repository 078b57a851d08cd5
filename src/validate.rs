// ✅ Row Validation
// Pure per-row validators: each raw row becomes either a typed record or a
// rejection carrying the reason. Malformed plan intervals are stopped here;
// the merger only ever sees well-formed dates.

use crate::loader::{RawClaim, RawEmployee, RawPlan};
use crate::model::{ClaimEvent, Employee, PlanInterval, RowOutcome, ValidationIssue};
use crate::normalize;
use std::collections::BTreeMap;

/// Maps email domain -> company EIN, loaded from company_lookup.json.
pub type CompanyLookup = BTreeMap<String, String>;

// ============================================================================
// EMPLOYEES
// ============================================================================

/// Validate one raw employee row. Rows with a syntactically bad email are
/// rejected; a missing start_date is tolerated here and reported separately
/// after cleaning (the row stays in the clean set).
pub fn validate_employee(raw: &RawEmployee, row_index: usize) -> RowOutcome<Employee> {
    let row_id = raw
        .person_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("row-{}", row_index));

    let email = raw.email.as_deref().unwrap_or("").trim().to_string();
    if !normalize::is_valid_email(&email) {
        return RowOutcome::Rejected(ValidationIssue::new(
            row_id,
            "email",
            format!("bad_email:{}", email),
        ));
    }

    let notes_parsed = raw
        .notes
        .as_deref()
        .map(normalize::parse_notes)
        .unwrap_or_default();

    RowOutcome::Valid(Employee {
        employee_id: row_id,
        full_name: raw.full_name.as_deref().and_then(normalize::normalize_name),
        email_domain: normalize::extract_domain(&email),
        email,
        title: raw
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        company_ein: raw
            .company_ein
            .as_deref()
            .map(str::trim)
            .filter(|ein| !ein.is_empty())
            .map(str::to_string),
        start_date: raw.start_date.as_deref().and_then(normalize::parse_date),
        notes_parsed,
        industry: None,
        revenue: None,
        headcount: None,
    })
}

/// Fill in missing EINs from the domain lookup table. Rows that already
/// carry an EIN are left alone.
pub fn infer_missing_eins(employees: &mut [Employee], lookup: &CompanyLookup) {
    for employee in employees.iter_mut() {
        if employee.company_ein.is_none() {
            if let Some(domain) = &employee.email_domain {
                employee.company_ein = lookup.get(domain).cloned();
            }
        }
    }
}

/// Carry the last seen title forward over rows that are missing one,
/// in input order.
pub fn fill_forward_titles(employees: &mut [Employee]) {
    let mut last_title: Option<String> = None;
    for employee in employees.iter_mut() {
        match &employee.title {
            Some(title) => last_title = Some(title.clone()),
            None => employee.title = last_title.clone(),
        }
    }
}

/// Final cleaning check: every clean row should carry a start date. Rows
/// that don't are reported but kept.
pub fn missing_start_date_issues(employees: &[Employee]) -> Vec<ValidationIssue> {
    employees
        .iter()
        .filter(|employee| employee.start_date.is_none())
        .map(|employee| ValidationIssue::new(employee.employee_id.clone(), "start_date", "missing"))
        .collect()
}

// ============================================================================
// PLAN INTERVALS
// ============================================================================

/// Validate one raw plan row. MalformedInterval cases (missing or
/// unparseable dates, end before start) are rejected so they never reach
/// the merger; a missing EIN is rejected too since the row cannot be
/// grouped.
pub fn validate_plan(raw: &RawPlan, row_index: usize) -> RowOutcome<PlanInterval> {
    let row_id = format!("plan-{}", row_index);

    let company_id = match raw.company_ein.as_deref().map(str::trim) {
        Some(ein) if !ein.is_empty() => ein.to_string(),
        _ => return RowOutcome::Rejected(ValidationIssue::new(row_id, "company_ein", "missing")),
    };

    let start_date = match parse_required_date(raw.start_date.as_deref()) {
        Ok(date) => date,
        Err(reason) => {
            return RowOutcome::Rejected(ValidationIssue::new(row_id, "start_date", reason))
        }
    };
    let end_date = match parse_required_date(raw.end_date.as_deref()) {
        Ok(date) => date,
        Err(reason) => {
            return RowOutcome::Rejected(ValidationIssue::new(row_id, "end_date", reason))
        }
    };

    if end_date < start_date {
        return RowOutcome::Rejected(ValidationIssue::new(
            row_id,
            "end_date",
            format!("end_before_start:{}<{}", end_date, start_date),
        ));
    }

    RowOutcome::Valid(PlanInterval {
        company_id,
        plan_type: raw.plan_type.as_deref().unwrap_or("").trim().to_string(),
        carrier_name: raw.carrier_name.as_deref().unwrap_or("").trim().to_string(),
        start_date,
        end_date,
    })
}

// ============================================================================
// CLAIMS
// ============================================================================

/// Validate one raw claim row. Missing amounts coalesce to 0.0; negative
/// or unparseable amounts are rejected.
pub fn validate_claim(raw: &RawClaim, row_index: usize) -> RowOutcome<ClaimEvent> {
    let row_id = format!("claim-{}", row_index);

    let company_id = match raw.company_ein.as_deref().map(str::trim) {
        Some(ein) if !ein.is_empty() => ein.to_string(),
        _ => return RowOutcome::Rejected(ValidationIssue::new(row_id, "company_ein", "missing")),
    };

    let service_date = match parse_required_date(raw.service_date.as_deref()) {
        Ok(date) => date,
        Err(reason) => {
            return RowOutcome::Rejected(ValidationIssue::new(row_id, "service_date", reason))
        }
    };

    let amount = match raw.amount.as_deref().map(str::trim) {
        None | Some("") => 0.0,
        Some(text) => match text.parse::<f64>() {
            Ok(value) if value >= 0.0 => value,
            Ok(_) => {
                return RowOutcome::Rejected(ValidationIssue::new(
                    row_id,
                    "amount",
                    format!("negative_amount:{}", text),
                ))
            }
            Err(_) => {
                return RowOutcome::Rejected(ValidationIssue::new(
                    row_id,
                    "amount",
                    format!("bad_amount:{}", text),
                ))
            }
        },
    };

    RowOutcome::Valid(ClaimEvent {
        company_id,
        service_date,
        amount,
    })
}

fn parse_required_date(value: Option<&str>) -> Result<chrono::NaiveDate, String> {
    match value.map(str::trim) {
        None | Some("") => Err("missing".to_string()),
        Some(text) => normalize::parse_date(text).ok_or_else(|| format!("bad_date:{}", text)),
    }
}
