//! Sanity checks of abundance tables and the explicit error list

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use super::table::RawTable;
use crate::Result;

/// Header cells accepted for the OTU column
const OTU_COLUMN_NAMES: [&str; 2] = ["# OTU ID", "#OTU ID"];

/// Outcome of the value check of a table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueCheck {
    /// All counts present and non-negative
    Ok,
    /// At least one empty cell
    Missing,
    /// At least one negative count
    Negative,
}

/// Result of checking one table
#[derive(Clone, Debug, PartialEq)]
pub enum FileStatus {
    /// The table was read and checked
    Checked {
        /// Exactly three columns
        ncols: bool,
        /// Count column does not sum to zero
        nonzero_sum: bool,
        /// First header cell names the OTU column
        column_name: bool,
        /// Missing or negative values
        values: ValueCheck,
    },
    /// The table could not be read
    Unreadable(String),
}

impl FileStatus {
    /// Check a parsed table
    pub fn of_table(table: &RawTable) -> Self {
        let ncols = table.columns.len() == 3;
        let column_name = table
            .columns
            .first()
            .is_some_and(|name| OTU_COLUMN_NAMES.contains(&name.as_str()));

        let width = table.columns.len();
        let mut values = ValueCheck::Ok;
        let mut sum = 0.0;
        for row in &table.rows {
            if row.len() < width || row.iter().any(|cell| cell.trim().is_empty()) {
                values = ValueCheck::Missing;
                continue;
            }
            match row.get(1).map(|cell| cell.trim().parse::<f64>()) {
                Some(Ok(count)) if count.is_nan() => values = ValueCheck::Missing,
                Some(Ok(count)) => {
                    if count < 0.0 && values == ValueCheck::Ok {
                        values = ValueCheck::Negative;
                    }
                    sum += count;
                }
                Some(Err(_)) | None => values = ValueCheck::Missing,
            }
        }

        FileStatus::Checked {
            ncols,
            nonzero_sum: sum != 0.0,
            column_name,
            values,
        }
    }

    /// Whether every check passed
    pub fn is_ok(&self) -> bool {
        matches!(
            self,
            FileStatus::Checked {
                ncols: true,
                nonzero_sum: true,
                column_name: true,
                values: ValueCheck::Ok,
            }
        )
    }

    /// Human-readable list of failed checks
    pub fn problems(&self) -> Vec<String> {
        match self {
            FileStatus::Unreadable(e) => vec![format!("unreadable: {}", e)],
            FileStatus::Checked { ncols, nonzero_sum, column_name, values } => {
                let mut problems = Vec::new();
                if !ncols {
                    problems.push("expected 3 columns".to_string());
                }
                if !nonzero_sum {
                    problems.push("counts sum to zero".to_string());
                }
                if !column_name {
                    problems.push("first column is not the OTU id".to_string());
                }
                match values {
                    ValueCheck::Ok => {}
                    ValueCheck::Missing => problems.push("missing values".to_string()),
                    ValueCheck::Negative => problems.push("negative values".to_string()),
                }
                problems
            }
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            write!(f, "ok")
        } else {
            write!(f, "{}", self.problems().join(", "))
        }
    }
}

/// Tables excluded from loading, with the reason for each
///
/// The list is a plain value handed to the loader; it can be persisted as
/// text with one `path<TAB>reason` line per file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorList {
    entries: BTreeMap<PathBuf, String>,
}

impl ErrorList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every failing file from check results
    pub fn from_statuses(statuses: &BTreeMap<PathBuf, FileStatus>) -> Self {
        let entries = statuses
            .iter()
            .filter(|(_, status)| !status.is_ok())
            .map(|(path, status)| (path.clone(), status.to_string()))
            .collect();
        ErrorList { entries }
    }

    /// Add a file
    pub fn insert(&mut self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.entries.insert(path.into(), reason.into());
    }

    /// Check whether a file is excluded
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Reason a file is excluded
    pub fn reason(&self, path: &Path) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Number of excluded files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the list as text
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text: String = self
            .entries
            .iter()
            .map(|(file, reason)| format!("{}\t{}\n", file.display(), reason))
            .collect();
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Read a list written by [`ErrorList::save`]; a missing reason is left empty
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let entries = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let (file, reason) = line.split_once('\t').unwrap_or((line, ""));
                (PathBuf::from(file), reason.to_string())
            })
            .collect();
        Ok(ErrorList { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_good_table() {
        let status = FileStatus::of_table(&table(
            &["# OTU ID", "ERR1", "taxonomy"],
            &[&["1", "4", "k__A"], &["2", "0", "k__B"]],
        ));
        assert!(status.is_ok());
        assert_eq!(status.to_string(), "ok");
    }

    #[test]
    fn test_failing_checks() {
        let status = FileStatus::of_table(&table(
            &["OTU", "ERR1"],
            &[&["1", "0"], &["2", "-0"]],
        ));
        assert!(!status.is_ok());
        let problems = status.problems();
        assert!(problems.contains(&"expected 3 columns".to_string()));
        assert!(problems.contains(&"counts sum to zero".to_string()));
        assert!(problems.contains(&"first column is not the OTU id".to_string()));

        let negative = FileStatus::of_table(&table(
            &["#OTU ID", "ERR1", "taxonomy"],
            &[&["1", "-3", "k__A"], &["2", "5", "k__B"]],
        ));
        assert!(matches!(negative, FileStatus::Checked { values: ValueCheck::Negative, .. }));

        let missing = FileStatus::of_table(&table(
            &["#OTU ID", "ERR1", "taxonomy"],
            &[&["1", "", "k__A"], &["2", "5", "k__B"]],
        ));
        assert!(matches!(missing, FileStatus::Checked { values: ValueCheck::Missing, .. }));
    }

    #[test]
    fn test_error_list_round_trip() {
        let mut statuses = BTreeMap::new();
        statuses.insert(PathBuf::from("a.tsv"), FileStatus::Unreadable("gone".to_string()));
        statuses.insert(
            PathBuf::from("b.tsv"),
            FileStatus::of_table(&table(&["# OTU ID", "x", "t"], &[&["1", "2", "k__A"]])),
        );

        let errors = ErrorList::from_statuses(&statuses);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(Path::new("a.tsv")));
        assert_eq!(errors.reason(Path::new("a.tsv")), Some("unreadable: gone"));

        let path = std::env::temp_dir().join("taxo_tree_test_error_list.txt");
        errors.save(&path).unwrap();
        assert_eq!(ErrorList::load(&path).unwrap(), errors);
        std::fs::remove_file(&path).ok();
    }
}
