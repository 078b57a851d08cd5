// Benefits Coverage Audit - Core Library
// Exposes all modules for use in the CLI and tests

pub mod checkpoint;
pub mod claims;
pub mod enrich;
pub mod gaps;
pub mod loader;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod roster;
pub mod spikes;
pub mod validate;

// Re-export commonly used types
pub use checkpoint::CheckpointStore;
pub use claims::RollingAggregator;
pub use enrich::{attach_enrichment, CachedMockClient, EnrichmentLookup, MockApi};
pub use gaps::GapDetector;
pub use loader::{dedupe_exact, load_claims, load_employees, load_plans, RawClaim, RawEmployee, RawPlan};
pub use merge::{group_intervals, merge_all, merge_group};
pub use model::{
    partition_outcomes, ClaimEvent, CostWindow, Employee, EnrichmentInfo, Gap, MergedSpan,
    PlanInterval, RosterRow, RosterSeverity, RowOutcome, SpikeFlag, ValidationIssue,
};
pub use pipeline::{analyze_claims, analyze_coverage, run_pipeline, PipelineConfig, RunSummary};
pub use roster::{roster_report, ExpectedHeadcounts};
pub use spikes::SpikeFlagger;
pub use validate::{
    fill_forward_titles, infer_missing_eins, missing_start_date_issues, validate_claim,
    validate_employee, validate_plan, CompanyLookup,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
