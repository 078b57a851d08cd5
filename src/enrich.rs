// 🌐 Firmographic Enrichment
// Capability interface for domain -> company info lookups, with a mock
// client backed by an in-memory map and a JSON cache file. The analytical
// reports never touch this; only employee cleaning attaches the fields.

use crate::model::{Employee, EnrichmentInfo};
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The lookup seam. Swap implementations without touching callers.
pub trait EnrichmentLookup {
    fn lookup(&mut self, domain: &str) -> Result<EnrichmentInfo>;
}

/// Shape of api_mock.json: a canned response served for every domain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockApi {
    #[serde(default)]
    pub sample_response: EnrichmentInfo,
}

/// Mock client with cache-first reads. The cache file is loaded tolerantly
/// at construction (a corrupt file starts an empty cache) and saved
/// best-effort on every miss.
pub struct CachedMockClient {
    sample: EnrichmentInfo,
    cache: BTreeMap<String, EnrichmentInfo>,
    cache_path: Option<PathBuf>,
}

impl CachedMockClient {
    pub fn new(sample: EnrichmentInfo, cache_path: Option<PathBuf>) -> Self {
        let cache = cache_path
            .as_deref()
            .filter(|path| path.exists())
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();

        CachedMockClient {
            sample,
            cache,
            cache_path,
        }
    }

    /// Build from an api_mock.json fixture file.
    pub fn from_mock_file(mock_path: &Path, cache_path: Option<PathBuf>) -> Result<Self> {
        let text = fs::read_to_string(mock_path)
            .with_context(|| format!("failed to read {}", mock_path.display()))?;
        let mock: MockApi = serde_json::from_str(&text)
            .with_context(|| format!("invalid api mock file {}", mock_path.display()))?;
        Ok(Self::new(mock.sample_response, cache_path))
    }

    fn save_cache(&self) {
        let Some(path) = &self.cache_path else {
            return;
        };
        match serde_json::to_string(&self.cache) {
            Ok(text) => {
                if let Err(err) = fs::write(path, text) {
                    warn!("failed to save enrichment cache {}: {}", path.display(), err);
                }
            }
            Err(err) => warn!("failed to serialize enrichment cache: {}", err),
        }
    }
}

impl EnrichmentLookup for CachedMockClient {
    fn lookup(&mut self, domain: &str) -> Result<EnrichmentInfo> {
        if let Some(cached) = self.cache.get(domain) {
            return Ok(cached.clone());
        }

        let mut response = self.sample.clone();
        response.domain = Some(domain.to_string());
        self.cache.insert(domain.to_string(), response.clone());
        self.save_cache();
        Ok(response)
    }
}

/// Look up each distinct email domain once and attach the firmographic
/// fields to every matching employee. A failed lookup is logged and that
/// domain is skipped; cleaning continues.
pub fn attach_enrichment(employees: &mut [Employee], client: &mut dyn EnrichmentLookup) {
    let mut domains: Vec<String> = Vec::new();
    for employee in employees.iter() {
        if let Some(domain) = &employee.email_domain {
            if !domains.contains(domain) {
                domains.push(domain.clone());
            }
        }
    }

    let mut by_domain: BTreeMap<String, EnrichmentInfo> = BTreeMap::new();
    for domain in domains {
        match client.lookup(&domain) {
            Ok(info) => {
                by_domain.insert(domain, info);
            }
            Err(err) => warn!("enrichment lookup failed for {}: {:#}", domain, err),
        }
    }
    info!("enriched {} distinct domains", by_domain.len());

    for employee in employees.iter_mut() {
        let Some(domain) = &employee.email_domain else {
            continue;
        };
        if let Some(info) = by_domain.get(domain) {
            employee.industry = info.industry.clone();
            employee.revenue = info.revenue;
            employee.headcount = info.headcount;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EnrichmentInfo {
        EnrichmentInfo {
            industry: Some("Software".to_string()),
            revenue: Some(1_000_000.0),
            headcount: Some(60),
            domain: None,
        }
    }

    fn employee(id: &str, domain: Option<&str>) -> Employee {
        Employee {
            employee_id: id.to_string(),
            full_name: None,
            email: format!("{}@example.com", id),
            email_domain: domain.map(str::to_string),
            title: None,
            company_ein: None,
            start_date: None,
            notes_parsed: Default::default(),
            industry: None,
            revenue: None,
            headcount: None,
        }
    }

    #[test]
    fn test_lookup_stamps_domain() {
        let mut client = CachedMockClient::new(sample(), None);
        let info = client.lookup("acme.com").unwrap();

        assert_eq!(info.domain.as_deref(), Some("acme.com"));
        assert_eq!(info.industry.as_deref(), Some("Software"));
    }

    #[test]
    fn test_lookup_is_cached() {
        let mut client = CachedMockClient::new(sample(), None);
        let first = client.lookup("acme.com").unwrap();
        let second = client.lookup("acme.com").unwrap();
        assert_eq!(first, second);
        assert_eq!(client.cache.len(), 1);
    }

    #[test]
    fn test_cache_round_trips_through_file() {
        let dir = std::env::temp_dir().join("coverage_audit_enrich_test");
        std::fs::create_dir_all(&dir).unwrap();
        let cache_path = dir.join("api_cache.json");
        let _ = std::fs::remove_file(&cache_path);

        {
            let mut client = CachedMockClient::new(sample(), Some(cache_path.clone()));
            client.lookup("acme.com").unwrap();
        }

        // A fresh client with a different sample still serves the cached
        // entry for acme.com.
        let mut reloaded =
            CachedMockClient::new(EnrichmentInfo::default(), Some(cache_path.clone()));
        let info = reloaded.lookup("acme.com").unwrap();
        assert_eq!(info.industry.as_deref(), Some("Software"));

        let _ = std::fs::remove_file(&cache_path);
    }

    #[test]
    fn test_corrupt_cache_file_starts_empty() {
        let dir = std::env::temp_dir().join("coverage_audit_enrich_corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let cache_path = dir.join("api_cache.json");
        std::fs::write(&cache_path, "{ not json").unwrap();

        let mut client = CachedMockClient::new(sample(), Some(cache_path.clone()));
        let info = client.lookup("acme.com").unwrap();
        assert_eq!(info.domain.as_deref(), Some("acme.com"));

        let _ = std::fs::remove_file(&cache_path);
    }

    #[test]
    fn test_attach_enrichment() {
        let mut employees = vec![
            employee("e1", Some("acme.com")),
            employee("e2", Some("acme.com")),
            employee("e3", None),
        ];
        let mut client = CachedMockClient::new(sample(), None);

        attach_enrichment(&mut employees, &mut client);

        assert_eq!(employees[0].industry.as_deref(), Some("Software"));
        assert_eq!(employees[1].headcount, Some(60));
        assert_eq!(employees[2].industry, None);
    }
}
