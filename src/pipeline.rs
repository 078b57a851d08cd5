// 🔧 Pipeline Orchestration
// Load -> dedupe -> validate -> clean/enrich -> checkpoint -> analytics ->
// reports. Single-threaded batch; the per-company loops are the natural
// parallelism boundary but nothing here shares mutable state across them.

use crate::checkpoint::CheckpointStore;
use crate::claims::RollingAggregator;
use crate::enrich::{attach_enrichment, CachedMockClient, EnrichmentLookup};
use crate::gaps::GapDetector;
use crate::loader;
use crate::merge;
use crate::model::{
    partition_outcomes, ClaimEvent, Employee, Gap, MergedSpan, PlanInterval, SpikeFlag,
};
use crate::report;
use crate::roster::{self, ExpectedHeadcounts};
use crate::spikes::SpikeFlagger;
use crate::validate::{self, CompanyLookup};
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const EMPLOYEES_FILE: &str = "employees_raw.csv";
const PLANS_FILE: &str = "plans_raw.csv";
const CLAIMS_FILE: &str = "claims_raw.csv";
const COMPANY_LOOKUP_FILE: &str = "company_lookup.json";
const API_MOCK_FILE: &str = "api_mock.json";
const EXPECTED_HEADCOUNTS_FILE: &str = "expected_headcounts.json";
const API_CACHE_FILE: &str = ".api_cache.json";
const HWM_DB_FILE: &str = "etl_hwm.sqlite";

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum day distance between intervals before a lapse is reported.
    pub gap_threshold_days: i64,

    /// Spike when current/prior strictly exceeds this ratio.
    pub spike_ratio: f64,

    /// Rolling claim window length in calendar days.
    pub window_days: i64,

    /// pct_change assigned to unbounded (zero-prior) spikes.
    pub spike_sentinel_pct: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            gap_threshold_days: 7,
            spike_ratio: 3.0,
            window_days: 90,
            spike_sentinel_pct: 999.0,
        }
    }
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub clean_employees: usize,
    pub validation_issues: usize,
    pub coverage_spans: usize,
    pub gaps: usize,
    pub spikes: usize,
    pub roster_rows: usize,
    pub failed_companies: Vec<String>,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} clean employees, {} validation errors | {} coverage spans, {} gaps, {} spikes, {} roster rows | {} companies failed",
            self.clean_employees,
            self.validation_issues,
            self.coverage_spans,
            self.gaps,
            self.spikes,
            self.roster_rows,
            self.failed_companies.len()
        )
    }
}

// ============================================================================
// PER-COMPANY ANALYTICS
// ============================================================================

/// Merge one company's intervals and detect its gaps. Kept fallible so a
/// single company's failure is contained by the caller instead of aborting
/// the run.
pub fn analyze_coverage(
    intervals: &[PlanInterval],
    config: &PipelineConfig,
) -> Result<(Vec<MergedSpan>, Vec<Gap>)> {
    let spans = merge::merge_all(intervals);
    let gaps = GapDetector::with_threshold(config.gap_threshold_days).detect(intervals);
    Ok((spans, gaps))
}

/// Aggregate one company's claims into rolling windows and flag spikes.
pub fn analyze_claims(events: &[ClaimEvent], config: &PipelineConfig) -> Result<Vec<SpikeFlag>> {
    let windows = RollingAggregator::with_window(config.window_days).windows(events);
    let flagger = SpikeFlagger {
        ratio_threshold: config.spike_ratio,
        sentinel_pct: config.spike_sentinel_pct,
    };
    Ok(flagger.flag(&windows))
}

fn group_by_company<T>(items: Vec<T>, key: impl Fn(&T) -> String) -> BTreeMap<String, Vec<T>> {
    let mut grouped: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        grouped.entry(key(&item)).or_default().push(item);
    }
    grouped
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Run the whole audit over a data directory, writing reports into out_dir.
/// Partial output is the contract: a company whose analytics fail is logged
/// and omitted while every other company still lands in the reports.
pub fn run_pipeline(
    data_dir: &Path,
    out_dir: &Path,
    config: &PipelineConfig,
) -> Result<RunSummary> {
    let run_id = uuid::Uuid::new_v4().to_string();
    info!("starting run {} over {}", run_id, data_dir.display());
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    // ---- Load + dedupe ----------------------------------------------------
    let raw_employees = loader::dedupe_exact(loader::load_employees(&data_dir.join(EMPLOYEES_FILE))?);
    let raw_plans = loader::dedupe_exact(loader::load_plans(&data_dir.join(PLANS_FILE))?);
    let raw_claims = loader::dedupe_exact(loader::load_claims(&data_dir.join(CLAIMS_FILE))?);
    info!(
        "loaded {} employee, {} plan, {} claim rows after dedupe",
        raw_employees.len(),
        raw_plans.len(),
        raw_claims.len()
    );

    // ---- Validate ---------------------------------------------------------
    let (mut employees, mut issues) = partition_outcomes(
        raw_employees
            .iter()
            .enumerate()
            .map(|(i, row)| validate::validate_employee(row, i))
            .collect(),
    );
    let (plan_intervals, plan_issues) = partition_outcomes(
        raw_plans
            .iter()
            .enumerate()
            .map(|(i, row)| validate::validate_plan(row, i))
            .collect(),
    );
    let (claim_events, claim_issues) = partition_outcomes(
        raw_claims
            .iter()
            .enumerate()
            .map(|(i, row)| validate::validate_claim(row, i))
            .collect(),
    );
    issues.extend(plan_issues);
    issues.extend(claim_issues);

    // ---- Clean + enrich employees -----------------------------------------
    let company_lookup = load_company_lookup(&data_dir.join(COMPANY_LOOKUP_FILE))?;
    validate::infer_missing_eins(&mut employees, &company_lookup);
    validate::fill_forward_titles(&mut employees);

    let mut client = build_enrichment_client(data_dir)?;
    attach_enrichment(&mut employees, client.as_mut());

    issues.extend(validate::missing_start_date_issues(&employees));
    info!(
        "{} clean employees, {} validation issues",
        employees.len(),
        issues.len()
    );

    // ---- Checkpoint -------------------------------------------------------
    record_checkpoint(&data_dir.join(HWM_DB_FILE), &employees, &run_id);

    // ---- Coverage analytics (per company) ---------------------------------
    let mut failed_companies = Vec::new();
    let mut all_spans: Vec<MergedSpan> = Vec::new();
    let mut all_gaps: Vec<Gap> = Vec::new();
    for (company_id, intervals) in
        group_by_company(plan_intervals, |interval| interval.company_id.clone())
    {
        match analyze_coverage(&intervals, config) {
            Ok((spans, gaps)) => {
                all_spans.extend(spans);
                all_gaps.extend(gaps);
            }
            Err(err) => {
                error!("coverage analysis failed for {}: {:#}", company_id, err);
                failed_companies.push(company_id);
            }
        }
    }

    // ---- Claims analytics (per company) -----------------------------------
    let mut all_spikes: Vec<SpikeFlag> = Vec::new();
    for (company_id, events) in group_by_company(claim_events, |event| event.company_id.clone()) {
        match analyze_claims(&events, config) {
            Ok(spikes) => all_spikes.extend(spikes),
            Err(err) => {
                error!("claims analysis failed for {}: {:#}", company_id, err);
                failed_companies.push(company_id);
            }
        }
    }

    // ---- Roster -----------------------------------------------------------
    let expected = load_expected_headcounts(&data_dir.join(EXPECTED_HEADCOUNTS_FILE))?;
    let roster_rows = roster::roster_report(&employees, &expected);

    // ---- Reports ----------------------------------------------------------
    report::write_validation_errors(&out_dir.join("validation_errors.csv"), &issues)?;
    report::write_clean_employees(&out_dir.join("clean_data.csv"), &employees)?;
    report::write_gaps(&out_dir.join("gaps.csv"), &all_gaps)?;
    report::write_spikes(&out_dir.join("spikes.csv"), &all_spikes)?;
    report::write_roster(&out_dir.join("roster.csv"), &roster_rows)?;

    let summary = RunSummary {
        run_id,
        clean_employees: employees.len(),
        validation_issues: issues.len(),
        coverage_spans: all_spans.len(),
        gaps: all_gaps.len(),
        spikes: all_spikes.len(),
        roster_rows: roster_rows.len(),
        failed_companies,
    };
    info!("run {} complete: {}", summary.run_id, summary.summary());
    Ok(summary)
}

// ============================================================================
// CONFIG FILE LOADING
// ============================================================================

/// Optional domain -> EIN table. Absent file means no inference; a present
/// but unreadable file is a real error.
fn load_company_lookup(path: &Path) -> Result<CompanyLookup> {
    if !path.exists() {
        info!("no {} found, skipping EIN inference", path.display());
        return Ok(CompanyLookup::new());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid lookup file {}", path.display()))
}

/// Optional expected headcount table for the roster report.
fn load_expected_headcounts(path: &Path) -> Result<ExpectedHeadcounts> {
    if !path.exists() {
        info!("no {} found, roster severities will be Unknown", path.display());
        return Ok(ExpectedHeadcounts::new());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid headcount file {}", path.display()))
}

fn build_enrichment_client(data_dir: &Path) -> Result<Box<dyn EnrichmentLookup>> {
    let mock_path = data_dir.join(API_MOCK_FILE);
    let cache_path = Some(data_dir.join(API_CACHE_FILE));
    if mock_path.exists() {
        Ok(Box::new(CachedMockClient::from_mock_file(
            &mock_path, cache_path,
        )?))
    } else {
        info!(
            "no {} found, enrichment serves empty responses",
            mock_path.display()
        );
        Ok(Box::new(CachedMockClient::new(
            Default::default(),
            cache_path,
        )))
    }
}

/// Checkpoint failures are logged, never fatal: the reports of this run
/// matter more than the incremental mark.
fn record_checkpoint(db_path: &Path, employees: &[Employee], run_id: &str) {
    let dates = employees.iter().filter_map(|e| e.start_date);
    match CheckpointStore::open(db_path) {
        Ok(store) => match store.record_employee_hwm(dates, run_id) {
            Ok(Some(max)) => info!("employee high-water mark advanced to {}", max),
            Ok(None) => info!("no dated employee rows, high-water mark untouched"),
            Err(err) => warn!("failed to record high-water mark: {:#}", err),
        },
        Err(err) => warn!("failed to open checkpoint store: {:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn setup_data_dir(name: &str) -> (PathBuf, PathBuf) {
        let base = std::env::temp_dir().join("coverage_audit_pipeline_test").join(name);
        let data = base.join("data");
        let out = base.join("out");
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&data).unwrap();
        (data, out)
    }

    fn write_fixtures(data: &Path) {
        fs::write(
            data.join(EMPLOYEES_FILE),
            "person_id,full_name,email,title,company_ein,start_date,notes\n\
             e1,ada lovelace,ada@acme.com,Engineer,,2023-01-15,mgr:Bob\n\
             e2,bob byron,bob@acme.com,,,2023-02-01,\n\
             e3,carol,broken-email,Analyst,22-2222222,2023-03-01,\n",
        )
        .unwrap();
        fs::write(
            data.join(PLANS_FILE),
            "company_ein,plan_type,carrier_name,start_date,end_date\n\
             11-1111111,Dental,carrierX,2023-01-01,2023-03-31\n\
             11-1111111,Dental,carrierY,2023-04-10,2023-06-30\n\
             11-1111111,Medical,carrierZ,2023-06-30,2023-01-01\n",
        )
        .unwrap();
        fs::write(
            data.join(CLAIMS_FILE),
            "company_ein,service_date,amount\n\
             11-1111111,2023-01-10,0\n\
             11-1111111,2023-03-01,1000\n",
        )
        .unwrap();
        fs::write(
            data.join(COMPANY_LOOKUP_FILE),
            "{\"acme.com\": \"11-1111111\"}",
        )
        .unwrap();
        fs::write(
            data.join(API_MOCK_FILE),
            "{\"sample_response\": {\"industry\": \"Software\", \"revenue\": 5000000, \"headcount\": 60}}",
        )
        .unwrap();
        fs::write(data.join(EXPECTED_HEADCOUNTS_FILE), "{\"11-1111111\": 2}").unwrap();
    }

    #[test]
    fn test_run_pipeline_end_to_end() {
        let (data, out) = setup_data_dir("end_to_end");
        write_fixtures(&data);

        let summary = run_pipeline(&data, &out, &PipelineConfig::default()).unwrap();

        // e3's email is rejected; e1/e2 survive with inferred EINs.
        assert_eq!(summary.clean_employees, 2);
        // bad email + malformed Medical interval.
        assert!(summary.validation_issues >= 2);
        // Dental gap 04-01..04-09.
        assert_eq!(summary.gaps, 1);
        // The $1000 claim lands on a zero-prior window.
        assert!(summary.spikes >= 1);
        assert!(summary.failed_companies.is_empty());

        let gaps = fs::read_to_string(out.join("gaps.csv")).unwrap();
        assert!(gaps.contains("11-1111111,Dental,2023-04-01,2023-04-09,9,carrierX,carrierY"));

        let errors = fs::read_to_string(out.join("validation_errors.csv")).unwrap();
        assert!(errors.contains("e3,email,bad_email:broken-email"));
        assert!(errors.contains("plan-2,end_date,end_before_start"));

        let clean = fs::read_to_string(out.join("clean_data.csv")).unwrap();
        assert!(clean.contains("e1,Ada Lovelace,ada@acme.com,acme.com,Engineer,11-1111111"));
        // e2 had no title; fill-forward carried Engineer.
        assert!(clean.contains("e2,Bob Byron,bob@acme.com,acme.com,Engineer,11-1111111"));
        assert!(clean.contains("Software"));

        let roster = fs::read_to_string(out.join("roster.csv")).unwrap();
        assert!(roster.contains("11-1111111,2,2,0.00,Low"));
    }

    #[test]
    fn test_run_pipeline_missing_input_fails() {
        let (data, out) = setup_data_dir("missing_input");
        // No fixture files at all.
        assert!(run_pipeline(&data, &out, &PipelineConfig::default()).is_err());
    }

    #[test]
    fn test_empty_inputs_complete_cleanly() {
        let (data, out) = setup_data_dir("empty_inputs");
        fs::write(
            data.join(EMPLOYEES_FILE),
            "person_id,full_name,email,title,company_ein,start_date,notes\n",
        )
        .unwrap();
        fs::write(
            data.join(PLANS_FILE),
            "company_ein,plan_type,carrier_name,start_date,end_date\n",
        )
        .unwrap();
        fs::write(data.join(CLAIMS_FILE), "company_ein,service_date,amount\n").unwrap();

        let summary = run_pipeline(&data, &out, &PipelineConfig::default()).unwrap();

        assert_eq!(summary.clean_employees, 0);
        assert_eq!(summary.gaps, 0);
        assert_eq!(summary.spikes, 0);
        assert!(out.join("gaps.csv").exists());
    }
}
