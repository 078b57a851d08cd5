// 🧹 Record Normalizer
// Field-level cleanup shared by every loader: email syntax, domain
// extraction, date coercion, name/notes normalization.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

/// Syntactic email check: something@something.tld after trimming.
pub fn is_valid_email(email: &str) -> bool {
    let trimmed = email.trim();
    !trimmed.is_empty() && EMAIL_RE.is_match(trimmed)
}

/// Lowercased domain after the last '@', or None when there is no '@'.
pub fn extract_domain(email: &str) -> Option<String> {
    let trimmed = email.trim();
    let (_, domain) = trimmed.rsplit_once('@')?;
    let domain = domain.trim().to_lowercase();
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

/// Collapse internal whitespace and Title Case each word.
pub fn normalize_name(name: &str) -> Option<String> {
    let collapsed: Vec<&str> = name.split_whitespace().collect();
    if collapsed.is_empty() {
        return None;
    }
    let titled: Vec<String> = collapsed
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect();
    Some(titled.join(" "))
}

/// Parse a date field, trying ISO then US formats. Unparseable values
/// coerce to None rather than failing the row.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .ok()
}

/// Extract simple structured info from a free-text notes field, e.g.
/// "mgr:Bob; team:Core" -> {mgr: Bob, team: Core}. Segments without a
/// colon are ignored.
pub fn parse_notes(notes: &str) -> BTreeMap<String, String> {
    let mut parsed = BTreeMap::new();
    for part in notes.split(|c| c == ';' || c == '|' || c == ',') {
        if let Some((key, value)) = part.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                parsed.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("  user@acme.com  "));
        assert!(!is_valid_email("abc"));
        assert!(!is_valid_email("no-at-symbol"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("user@acme.com"), Some("acme.com".to_string()));
        assert_eq!(extract_domain("User@ACME.COM"), Some("acme.com".to_string()));
        assert_eq!(extract_domain("no-at-symbol"), None);
        assert_eq!(extract_domain("trailing@"), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(
            normalize_name("  jane   van  doe "),
            Some("Jane Van Doe".to_string())
        );
        assert_eq!(normalize_name(""), None);
        assert_eq!(normalize_name("   "), None);
    }

    #[test]
    fn test_parse_date_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 4, 10).unwrap();
        assert_eq!(parse_date("2023-04-10"), Some(expected));
        assert_eq!(parse_date("04/10/2023"), Some(expected));
        assert_eq!(parse_date("10 Apr 2023"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_notes() {
        let parsed = parse_notes("mgr:Bob; team:Core | site : HQ, freeform");
        assert_eq!(parsed.get("mgr"), Some(&"Bob".to_string()));
        assert_eq!(parsed.get("team"), Some(&"Core".to_string()));
        assert_eq!(parsed.get("site"), Some(&"HQ".to_string()));
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_parse_notes_empty() {
        assert!(parse_notes("").is_empty());
        assert!(parse_notes("no pairs here").is_empty());
    }
}
