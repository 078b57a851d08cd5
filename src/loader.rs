// 📂 Raw CSV Ingestion
// Loads the three raw input files into untyped row structs. Header and
// field whitespace is trimmed; missing columns deserialize to None so a
// sparse export still loads. Type coercion happens in the validators.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// RAW ROWS
// ============================================================================

/// One row of employees_raw.csv, as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEmployee {
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company_ein: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One row of plans_raw.csv, as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlan {
    #[serde(default)]
    pub company_ein: Option<String>,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub carrier_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// One row of claims_raw.csv, as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClaim {
    #[serde(default)]
    pub company_ein: Option<String>,
    #[serde(default)]
    pub service_date: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

// ============================================================================
// LOADERS
// ============================================================================

fn reader_for(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

pub fn load_employees(path: &Path) -> Result<Vec<RawEmployee>> {
    let mut rdr = reader_for(path)?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: RawEmployee = result.context("failed to deserialize employee row")?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_plans(path: &Path) -> Result<Vec<RawPlan>> {
    let mut rdr = reader_for(path)?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: RawPlan = result.context("failed to deserialize plan row")?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_claims(path: &Path) -> Result<Vec<RawClaim>> {
    let mut rdr = reader_for(path)?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: RawClaim = result.context("failed to deserialize claim row")?;
        rows.push(row);
    }
    Ok(rows)
}

// ============================================================================
// EXACT-ROW DEDUPE
// ============================================================================

/// Drop exact duplicate rows, keeping the first occurrence. The content
/// hash stands in for row identity; nothing in the raw files is a reliable
/// key at this stage.
pub fn dedupe_exact<T: Serialize>(rows: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            let serialized = serde_json::to_string(row).unwrap_or_default();
            let mut hasher = Sha256::new();
            hasher.update(serialized.as_bytes());
            seen.insert(format!("{:x}", hasher.finalize()))
        })
        .collect()
}
