//! Reading tab-separated abundance tables

use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::core::LoaderConfig;
use crate::{Result, TaxoTreeError};

/// A raw table: header cells and data rows, all as text
#[derive(Clone, Debug, PartialEq)]
pub struct RawTable {
    /// Header cells
    pub columns: Vec<String>,
    /// Data rows
    pub rows: Vec<Vec<String>>,
}

/// One line of an abundance table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbundanceRecord {
    /// OTU identifier
    pub otu_id: String,
    /// Abundance count
    pub count: f64,
    /// Rank-prefixed taxonomy record
    pub taxonomy: String,
}

/// Read a table whose header sits on line `config.header_row`
pub fn read_raw_table<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> Result<RawTable> {
    let delimiter = u8::try_from(config.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            TaxoTreeError::InvalidConfig(format!(
                "delimiter {:?} is not an ASCII character",
                config.delimiter
            ))
        })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(path.as_ref())?;

    let mut records = reader.records().skip(config.header_row);
    let columns: Vec<String> = match records.next() {
        Some(header) => header?.iter().map(str::to_string).collect(),
        None => {
            return Err(TaxoTreeError::MalformedTable(format!(
                "{} has no header on line {}",
                path.as_ref().display(),
                config.header_row
            )));
        }
    };

    let mut rows = Vec::new();
    for record in records {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    Ok(RawTable { columns, rows })
}

impl RawTable {
    /// Convert rows into abundance records (OTU id, count, taxonomy)
    pub fn to_records(&self) -> Result<Vec<AbundanceRecord>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(line, row)| {
                if row.len() < 3 {
                    return Err(TaxoTreeError::MalformedTable(format!(
                        "row {} has {} fields, expected 3",
                        line,
                        row.len()
                    )));
                }
                let count = row[1].trim().parse::<f64>().map_err(|e| {
                    TaxoTreeError::MalformedTable(format!("row {}: bad count {:?}: {}", line, row[1], e))
                })?;
                Ok(AbundanceRecord {
                    otu_id: row[0].clone(),
                    count,
                    taxonomy: row[2].clone(),
                })
            })
            .collect()
    }
}

/// Read the abundance records of a table
pub fn read_table<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> Result<Vec<AbundanceRecord>> {
    read_raw_table(path, config)?.to_records()
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures::write_table;

    #[test]
    fn test_read_table() {
        let path = std::env::temp_dir().join("taxo_tree_test_read_table.tsv");
        write_table(
            &path,
            "# OTU ID\tERR1\ttaxonomy",
            &[
                ("1", "10", "k__Bacteria; p__Firmicutes"),
                ("2", "3.5", "sk__Archaea;k__;p__Euryarchaeota"),
            ],
        );

        let config = LoaderConfig::default();
        let raw = read_raw_table(&path, &config).unwrap();
        assert_eq!(raw.columns, vec!["# OTU ID", "ERR1", "taxonomy"]);
        assert_eq!(raw.rows.len(), 2);

        let records = read_table(&path, &config).unwrap();
        assert_eq!(records[0].count, 10.0);
        assert_eq!(records[1].taxonomy, "sk__Archaea;k__;p__Euryarchaeota");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_wide_delimiter_rejected() {
        let path = std::env::temp_dir().join("taxo_tree_test_wide_delimiter.tsv");
        write_table(&path, "# OTU ID\tERR1\ttaxonomy", &[("1", "2", "k__A")]);

        let config = LoaderConfig {
            delimiter: '\u{2c6}',
            ..LoaderConfig::default()
        };
        assert!(matches!(
            read_raw_table(&path, &config),
            Err(TaxoTreeError::InvalidConfig(_))
        ));

        let latin1 = LoaderConfig {
            delimiter: '\u{e9}',
            ..LoaderConfig::default()
        };
        assert!(matches!(
            read_table(&path, &latin1),
            Err(TaxoTreeError::InvalidConfig(_))
        ));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_bad_count() {
        let table = RawTable {
            columns: vec!["# OTU ID".into(), "x".into(), "taxonomy".into()],
            rows: vec![vec!["1".into(), "many".into(), "k__A".into()]],
        };
        assert!(matches!(table.to_records(), Err(TaxoTreeError::MalformedTable(_))));
    }
}
