use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

use coverage_audit::{run_pipeline, PipelineConfig};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (data_dir, out_dir, config) = parse_args(&args)?;

    println!("📊 Benefits Coverage Audit");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Data:   {}", data_dir.display());
    println!("Output: {}", out_dir.display());

    let summary = run_pipeline(&data_dir, &out_dir, &config)?;

    println!("\n✓ Clean employees:   {}", summary.clean_employees);
    println!("✓ Validation errors: {}", summary.validation_issues);
    println!("✓ Coverage spans:    {}", summary.coverage_spans);
    println!("✓ Gaps reported:     {}", summary.gaps);
    println!("✓ Spikes flagged:    {}", summary.spikes);
    println!("✓ Roster rows:       {}", summary.roster_rows);
    if !summary.failed_companies.is_empty() {
        println!(
            "⚠ Companies omitted after failures: {}",
            summary.failed_companies.join(", ")
        );
    }
    println!("\nRun {} complete.", summary.run_id);

    Ok(())
}

/// `coverage-audit <data_dir> [out_dir] [--gap-days N] [--spike-ratio X]
/// [--window-days N]`
fn parse_args(args: &[String]) -> Result<(PathBuf, PathBuf, PipelineConfig)> {
    let mut config = PipelineConfig::default();
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--gap-days" => config.gap_threshold_days = next_value(&mut iter, "--gap-days")?,
            "--spike-ratio" => config.spike_ratio = next_value(&mut iter, "--spike-ratio")?,
            "--window-days" => config.window_days = next_value(&mut iter, "--window-days")?,
            flag if flag.starts_with("--") => bail!("unknown flag: {}", flag),
            _ => positional.push(arg.clone()),
        }
    }

    let data_dir = PathBuf::from(positional.first().map(String::as_str).unwrap_or("."));
    let out_dir = positional
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join("outputs"));

    Ok((data_dir, out_dir, config))
}

fn next_value<T: std::str::FromStr>(
    iter: &mut std::slice::Iter<'_, String>,
    flag: &str,
) -> Result<T> {
    match iter.next().map(|v| v.parse::<T>()) {
        Some(Ok(value)) => Ok(value),
        _ => bail!("{} expects a numeric value", flag),
    }
}
