// 📝 Report Writers
// Tabular outputs with the column orders the downstream consumers expect.
// Dates are written as YYYY-MM-DD; money columns carry two decimals.

use crate::model::{Employee, Gap, RosterRow, SpikeFlag, ValidationIssue};
use anyhow::{Context, Result};
use std::path::Path;

fn writer_for(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))
}

pub fn write_gaps(path: &Path, gaps: &[Gap]) -> Result<()> {
    let mut wtr = writer_for(path)?;
    wtr.write_record([
        "company_name",
        "plan_type",
        "gap_start",
        "gap_end",
        "gap_length_days",
        "previous_carrier",
        "next_carrier",
    ])?;
    for gap in gaps {
        wtr.write_record([
            gap.company_id.clone(),
            gap.plan_type.clone(),
            gap.gap_start.to_string(),
            gap.gap_end.to_string(),
            gap.gap_length_days.to_string(),
            gap.previous_carrier.clone(),
            gap.next_carrier.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_spikes(path: &Path, spikes: &[SpikeFlag]) -> Result<()> {
    let mut wtr = writer_for(path)?;
    wtr.write_record([
        "company_name",
        "window_start",
        "window_end",
        "prev_90d_cost",
        "current_90d_cost",
        "pct_change",
    ])?;
    for spike in spikes {
        wtr.write_record([
            spike.company_id.clone(),
            spike.window_start.to_string(),
            spike.window_end.to_string(),
            format!("{:.2}", spike.prior_cost),
            format!("{:.2}", spike.current_cost),
            format!("{:.2}", spike.pct_change),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_roster(path: &Path, rows: &[RosterRow]) -> Result<()> {
    let mut wtr = writer_for(path)?;
    wtr.write_record(["company_name", "expected", "observed", "pct_diff", "severity"])?;
    for row in rows {
        let pct = row
            .pct_diff
            .map(|p| format!("{:.2}", p))
            .unwrap_or_default();
        wtr.write_record([
            row.company_id.clone(),
            row.expected.to_string(),
            row.observed.to_string(),
            pct,
            row.severity.as_str().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_validation_errors(path: &Path, issues: &[ValidationIssue]) -> Result<()> {
    let mut wtr = writer_for(path)?;
    wtr.write_record(["row_id", "field", "error_reason"])?;
    for issue in issues {
        wtr.write_record([
            issue.row_id.as_str(),
            issue.field.as_str(),
            issue.reason.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_clean_employees(path: &Path, employees: &[Employee]) -> Result<()> {
    let mut wtr = writer_for(path)?;
    wtr.write_record([
        "employee_id",
        "full_name",
        "email",
        "email_domain",
        "title",
        "company_ein",
        "start_date",
        "notes_parsed",
        "industry",
        "revenue",
        "headcount",
    ])?;
    for employee in employees {
        let notes = if employee.notes_parsed.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&employee.notes_parsed)?
        };
        wtr.write_record([
            employee.employee_id.clone(),
            employee.full_name.clone().unwrap_or_default(),
            employee.email.clone(),
            employee.email_domain.clone().unwrap_or_default(),
            employee.title.clone().unwrap_or_default(),
            employee.company_ein.clone().unwrap_or_default(),
            employee
                .start_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            notes,
            employee.industry.clone().unwrap_or_default(),
            employee
                .revenue
                .map(|r| format!("{:.2}", r))
                .unwrap_or_default(),
            employee
                .headcount
                .map(|h| h.to_string())
                .unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RosterSeverity;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn temp_out(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("coverage_audit_report_test");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_write_gaps_columns() {
        let path = temp_out("gaps.csv");
        let gaps = vec![Gap {
            company_id: "11-1111111".to_string(),
            plan_type: "Dental".to_string(),
            gap_start: date(2023, 4, 1),
            gap_end: date(2023, 4, 9),
            gap_length_days: 9,
            previous_carrier: "carrierX".to_string(),
            next_carrier: "carrierY".to_string(),
        }];

        write_gaps(&path, &gaps).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "company_name,plan_type,gap_start,gap_end,gap_length_days,previous_carrier,next_carrier"
        );
        assert_eq!(
            lines.next().unwrap(),
            "11-1111111,Dental,2023-04-01,2023-04-09,9,carrierX,carrierY"
        );
    }

    #[test]
    fn test_write_spikes_formats_money() {
        let path = temp_out("spikes.csv");
        let spikes = vec![SpikeFlag {
            company_id: "A".to_string(),
            window_start: date(2023, 3, 4),
            window_end: date(2023, 6, 1),
            prior_cost: 0.0,
            current_cost: 1000.0,
            pct_change: 999.0,
        }];

        write_spikes(&path, &spikes).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.contains("A,2023-03-04,2023-06-01,0.00,1000.00,999.00"));
    }

    #[test]
    fn test_write_roster_blank_pct_for_unknown() {
        let path = temp_out("roster.csv");
        let rows = vec![RosterRow {
            company_id: "A".to_string(),
            expected: 0,
            observed: 3,
            pct_diff: None,
            severity: RosterSeverity::Unknown,
        }];

        write_roster(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.contains("A,0,3,,Unknown"));
    }

    #[test]
    fn test_write_validation_errors() {
        let path = temp_out("validation_errors.csv");
        let issues = vec![ValidationIssue::new("e2", "email", "bad_email:nope")];

        write_validation_errors(&path, &issues).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("row_id,field,error_reason"));
        assert!(text.contains("e2,email,bad_email:nope"));
    }
}
