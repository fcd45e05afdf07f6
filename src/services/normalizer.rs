// src/services/normalizer.rs
use crate::errors::ImportError;
use crate::models::MonthlyReturns;
use crate::services::calculations::annual_yield;
use log::{debug, info, warn};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Locates `"monthlyReturns": {...}` in the page, tolerating escaped quotes.
fn monthly_returns_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\\*"monthlyReturns\\*"\s*:\s*(\{[^}]+\})"#)
            .expect("monthlyReturns pattern is valid")
    })
}

/// Monthly returns grouped by calendar year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedReturns {
    pub years: BTreeMap<i32, Vec<f64>>,
    /// Minimum year in the whole payload, before any start-year filtering.
    pub earliest_year: Option<i32>,
}

/// Extracts the embedded month -> return object from raw page text.
///
/// Every backslash is stripped before decoding. This only works because the
/// payload holds dates and numbers; a value containing a backslash would be mangled.
pub fn parse_monthly_returns(raw_text: &str) -> Result<MonthlyReturns, ImportError> {
    let captured = monthly_returns_pattern()
        .captures(raw_text)
        .and_then(|caps| caps.get(1))
        .ok_or(ImportError::Extraction)?
        .as_str();

    let cleaned = captured.replace('\\', "");
    debug!("Extracted monthlyReturns payload ({} chars)", cleaned.len());

    let object: serde_json::Map<String, Value> = serde_json::from_str(&cleaned).map_err(|e| {
        let snippet: String = cleaned.chars().take(30).collect();
        ImportError::MalformedPayload(format!("{} | String: {}...", e, snippet))
    })?;

    let mut monthly = MonthlyReturns::new();
    for (key, value) in object {
        let parsed = match &value {
            Value::Null => None,
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().parse::<f64>().map_err(|_| {
                ImportError::MalformedPayload(format!("non-numeric value {:?} for {}", s, key))
            })?),
            other => {
                return Err(ImportError::MalformedPayload(format!(
                    "unexpected value {} for {}",
                    other, key
                )))
            }
        };
        monthly.insert(key, parsed);
    }

    info!("Parsed {} monthly return entries", monthly.len());
    Ok(monthly)
}

/// Partitions "YYYY-MM" entries by year. Blank values are skipped (an explicit
/// 0 is kept), as are keys that do not split into exactly two dash-separated parts.
pub fn group_by_year(monthly: &MonthlyReturns) -> GroupedReturns {
    let mut grouped = GroupedReturns::default();

    for (key, value) in monthly {
        let Some(value) = value else { continue };
        if !value.is_finite() {
            warn!("Skipping non-finite return for {}", key);
            continue;
        }

        let parts: Vec<&str> = key.split('-').collect();
        if parts.len() != 2 {
            debug!("Skipping malformed month key {:?}", key);
            continue;
        }
        let Ok(year) = parts[0].trim().parse::<i32>() else {
            debug!("Skipping month key with non-numeric year {:?}", key);
            continue;
        };

        grouped.earliest_year = Some(grouped.earliest_year.map_or(year, |e| e.min(year)));
        grouped.years.entry(year).or_default().push(*value);
    }

    grouped
}

/// Annual yield for every grouped year inside `[start_year, end_year]`.
pub fn annual_yields(grouped: &GroupedReturns, start_year: i32, end_year: i32) -> BTreeMap<i32, f64> {
    if start_year > end_year {
        return BTreeMap::new();
    }
    grouped
        .years
        .range(start_year..=end_year)
        .filter(|(_, months)| !months.is_empty())
        .map(|(year, months)| (*year, annual_yield(months)))
        .filter(|(_, y)| y.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_and_plain_payloads_match() {
        let escaped = r#"<script>self.__next_f.push([1,"{\"monthlyReturns\":{\"2021-01\": \"3.5\",\"2021-02\":-1.2}}"])</script>"#;
        let plain = r#"<html>"monthlyReturns": {"2021-01": "3.5", "2021-02": -1.2}</html>"#;

        let a = parse_monthly_returns(escaped).unwrap();
        let b = parse_monthly_returns(plain).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get("2021-01"), Some(&Some(3.5)));
    }

    #[test]
    fn double_escaped_payload_is_accepted() {
        let text = r#"\\\"monthlyReturns\\\":{\\\"2020-05\\\":2.25}"#;
        let parsed = parse_monthly_returns(text).unwrap();
        assert_eq!(parsed.get("2020-05"), Some(&Some(2.25)));
    }

    #[test]
    fn missing_object_is_extraction_error() {
        let err = parse_monthly_returns("<html>no data here</html>").unwrap_err();
        assert!(matches!(err, ImportError::Extraction));
    }

    #[test]
    fn undecodable_object_is_malformed() {
        let err = parse_monthly_returns(r#""monthlyReturns": {2021-01: 3.5}"#).unwrap_err();
        assert!(matches!(err, ImportError::MalformedPayload(_)));

        let err = parse_monthly_returns(r#""monthlyReturns": {"2021-01": "abc"}"#).unwrap_err();
        assert!(matches!(err, ImportError::MalformedPayload(_)));
    }

    #[test]
    fn blank_values_are_absent() {
        let parsed = parse_monthly_returns(r#""monthlyReturns": {"2021-01": null, "2021-02": "", "2021-03": 0}"#).unwrap();
        assert_eq!(parsed.get("2021-01"), Some(&None));
        assert_eq!(parsed.get("2021-02"), Some(&None));
        assert_eq!(parsed.get("2021-03"), Some(&Some(0.0)));
    }

    #[test]
    fn grouping_skips_blanks_and_malformed_keys() {
        let monthly: MonthlyReturns = [
            ("2019-12".to_string(), Some(1.0)),
            ("2020-01".to_string(), Some(0.0)),
            ("2020-02".to_string(), None),
            ("2020-03-01".to_string(), Some(9.0)),
            ("2020".to_string(), Some(9.0)),
            ("2021-01".to_string(), Some(2.0)),
        ]
        .into_iter()
        .collect();

        let grouped = group_by_year(&monthly);
        assert_eq!(grouped.earliest_year, Some(2019));
        assert_eq!(grouped.years.get(&2020), Some(&vec![0.0]));
        assert_eq!(grouped.years.get(&2021), Some(&vec![2.0]));
        assert_eq!(grouped.years.len(), 3);
    }

    #[test]
    fn earliest_year_ignores_later_filtering() {
        let monthly: MonthlyReturns = [
            ("2011-06".to_string(), Some(1.0)),
            ("2022-01".to_string(), Some(10.0)),
            ("2022-02".to_string(), Some(-5.0)),
        ]
        .into_iter()
        .collect();

        let grouped = group_by_year(&monthly);
        assert_eq!(grouped.earliest_year, Some(2011));

        let yields = annual_yields(&grouped, 2020, 2026);
        assert_eq!(yields.len(), 1);
        assert!((yields[&2022] - 4.5).abs() < 1e-9);
    }

    #[test]
    fn empty_payload_has_no_earliest_year() {
        let grouped = group_by_year(&MonthlyReturns::new());
        assert_eq!(grouped.earliest_year, None);
        assert!(annual_yields(&grouped, 2000, 2026).is_empty());
    }
}
