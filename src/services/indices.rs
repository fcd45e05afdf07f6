// src/services/indices.rs
use chrono::{Datelike, Utc};
use csv::Reader;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::io;

use crate::models::{IndexDefinition, FLOOR_YEAR};

pub type Result<T> = std::result::Result<T, Box<dyn StdError + Send + Sync>>;

/// Annual price returns of the benchmark indices, one row per (index, year).
const BUILTIN_INDICES_CSV: &str = include_str!("../../data/indices.csv");

#[derive(Debug, Deserialize, Serialize)]
struct IndexRow {
    index: String,
    color: String,
    year: i32,
    return_pct: f64,
}

/// Parses `index,color,year,return_pct` rows, keeping first-appearance order of indices.
/// Rows outside [2000, current_year] are skipped.
pub fn load_index_definitions(csv_text: &str, current_year: i32) -> Result<Vec<IndexDefinition>> {
    let mut rdr = Reader::from_reader(csv_text.as_bytes());
    let mut indices: Vec<IndexDefinition> = Vec::new();

    for record in rdr.deserialize::<IndexRow>() {
        let row = record?;
        let name = row.index.trim();

        if !(FLOOR_YEAR..=current_year).contains(&row.year) {
            warn!("Skipping {} row for out-of-range year {}", name, row.year);
            continue;
        }

        let position = match indices.iter().position(|i| i.name == name) {
            Some(pos) => pos,
            None => {
                indices.push(IndexDefinition {
                    name: name.to_string(),
                    color: row.color.trim().to_string(),
                    returns: Default::default(),
                });
                indices.len() - 1
            }
        };

        if !row.return_pct.is_finite() {
            return Err(format!("Non-finite return for {} in {}", name, row.year).into());
        }
        if indices[position].returns.insert(row.year, row.return_pct).is_some() {
            return Err(format!("Duplicate row for {} in {}", name, row.year).into());
        }
    }

    info!("Loaded {} index definitions", indices.len());
    Ok(indices)
}

/// Writes definitions back in the same `index,color,year,return_pct` layout.
pub fn write_index_definitions<W: io::Write>(writer: W, indices: &[IndexDefinition]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for index in indices {
        for (year, return_pct) in &index.returns {
            wtr.serialize(IndexRow {
                index: index.name.clone(),
                color: index.color.clone(),
                year: *year,
                return_pct: *return_pct,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn builtin_indices() -> Result<Vec<IndexDefinition>> {
    load_index_definitions(BUILTIN_INDICES_CSV, Utc::now().year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_loads_in_order() {
        let indices = builtin_indices().unwrap();
        let names: Vec<&str> = indices.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["SPX500", "NSDQ100", "SWDA_L", "EUSTX50", "CHINA50"]);

        let spx = &indices[0];
        assert_eq!(spx.color, "#38bdf8");
        assert_eq!(spx.returns.keys().next(), Some(&2000));
        assert!(indices.iter().all(|i| i.returns.keys().all(|y| *y >= 2000)));
    }

    #[test]
    fn partial_coverage_is_kept() {
        let indices = builtin_indices().unwrap();
        let world = indices.iter().find(|i| i.name == "SWDA_L").unwrap();
        assert!(!world.returns.contains_key(&2011));
        assert!(world.returns.contains_key(&2012));
    }

    #[test]
    fn duplicate_year_is_rejected() {
        let csv = "index,color,year,return_pct\nA,#fff,2020,1.0\nA,#fff,2020,2.0\n";
        assert!(load_index_definitions(csv, 2026).is_err());
    }

    #[test]
    fn malformed_number_is_rejected() {
        let csv = "index,color,year,return_pct\nA,#fff,2020,abc\n";
        assert!(load_index_definitions(csv, 2026).is_err());
    }

    #[test]
    fn written_rows_load_back_in_order() {
        let indices = vec![
            IndexDefinition {
                name: "NSDQ100".to_string(),
                color: "#a855f7".to_string(),
                returns: [(2021, 26.63), (2022, -32.97)].into_iter().collect(),
            },
            IndexDefinition {
                name: "SPX500".to_string(),
                color: "#38bdf8".to_string(),
                returns: [(2022, -19.44)].into_iter().collect(),
            },
        ];

        let mut out = Vec::new();
        write_index_definitions(&mut out, &indices).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("index,color,year,return_pct\nNSDQ100,#a855f7,2021,26.63\n"));
        assert_eq!(load_index_definitions(&text, 2026).unwrap(), indices);
    }

    #[test]
    fn years_outside_range_are_skipped() {
        let csv = "index,color,year,return_pct\nA,#fff,1999,7.0\nA,#fff,2020,1.0\nA,#fff,2027,3.0\n";
        let indices = load_index_definitions(csv, 2026).unwrap();
        let years: Vec<i32> = indices[0].returns.keys().copied().collect();
        assert_eq!(years, vec![2020]);
    }
}
