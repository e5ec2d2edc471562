//! Label normalisation and identifier construction
//!
//! Taxonomy records arrive as rank-prefixed labels joined by a separator,
//! e.g. `sk__Bacteria;k__Bacteria;p__Firmicutes`. Older exports start at
//! the kingdom rank and use `"; "` as separator; [`fix_legacy_labels`]
//! brings them in line before segmentation.

use serde::{Serialize, Deserialize};
use crate::{Result, TaxoTreeError};

/// Default separator between ranks
pub const DEFAULT_SEPARATOR: &str = ";";

/// Rank prefix that marks legacy records
const LEGACY_ROOT_RANK: &str = "k__";

/// Rank prefix inserted above legacy records
const SUPERKINGDOM_RANK: &str = "sk__";

const RANK_MARKER: &str = "__";

/// Normalise legacy separators and expand a leading kingdom rank.
///
/// `"<sep> "` becomes `sep`, and a record starting with `k__<name>` gets a
/// superkingdom `sk__<name>` inserted in front of it.
pub fn fix_legacy_labels(record: &str, sep: &str) -> String {
    let record = record.replace(&format!("{} ", sep), sep);
    match record.strip_prefix(LEGACY_ROOT_RANK) {
        Some(rest) => {
            let name = rest.split(sep).next().unwrap_or_default();
            format!("{}{}{}{}", SUPERKINGDOM_RANK, name, sep, record)
        }
        None => record,
    }
}

/// Split a record into labels, dropping empty segments
pub fn split_path(record: &str, sep: &str) -> Vec<String> {
    record
        .split(sep)
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// Name part of a rank-prefixed label (`"g__Bacillus"` -> `"Bacillus"`)
pub fn rank_name(label: &str) -> &str {
    label.rsplit(RANK_MARKER).next().unwrap_or(label)
}

/// Fill ranks left empty (`"g__"`) with the name of the last rank
pub fn fill_empty_ranks<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let tail = labels.last().map(|last| rank_name(last.as_ref())).unwrap_or_default();
    labels
        .iter()
        .map(|label| {
            let label = label.as_ref();
            if label.ends_with(RANK_MARKER) {
                format!("{}{}", label, tail)
            } else {
                label.to_string()
            }
        })
        .collect()
}

/// Turn a record into unique, cumulative identifiers.
///
/// Empty ranks are filled by [`fill_empty_ranks`], then identifier `i` is
/// the record's first `i + 1` labels joined by `sep`, so equal labels under
/// different parents never collide.
pub fn cumulative_ids(record: &str, sep: &str) -> Vec<String> {
    let labels: Vec<&str> = record.split(sep).collect();
    let filled = fill_empty_ranks(&labels);
    (1..=filled.len()).map(|i| filled[..i].join(sep)).collect()
}

/// Turns raw taxonomy records into tree paths
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelRewriter {
    /// Separator between ranks
    pub separator: String,
    /// Apply [`fix_legacy_labels`] before segmentation
    pub fix_legacy: bool,
}

impl LabelRewriter {
    /// Create a rewriter with a custom separator
    pub fn new(separator: impl Into<String>) -> Self {
        LabelRewriter {
            separator: separator.into(),
            fix_legacy: true,
        }
    }

    /// Disable the legacy fix
    pub fn without_legacy_fix(mut self) -> Self {
        self.fix_legacy = false;
        self
    }

    fn normalise(&self, record: &str) -> Result<String> {
        let record = record.trim();
        if record.is_empty() {
            return Err(TaxoTreeError::MalformedPath("empty taxonomy record".to_string()));
        }
        Ok(if self.fix_legacy {
            fix_legacy_labels(record, &self.separator)
        } else {
            record.to_string()
        })
    }

    /// Labels of a record in rank order, empty ranks filled.
    ///
    /// Bare labels are only unique when no name appears under two
    /// parents; [`LabelRewriter::to_id_path`] has no such restriction.
    pub fn to_path(&self, record: &str) -> Result<Vec<String>> {
        let record = self.normalise(record)?;
        Ok(fill_empty_ranks(&split_path(&record, &self.separator)))
    }

    /// Cumulative identifiers of a record, usable as tree identifiers
    pub fn to_id_path(&self, record: &str) -> Result<Vec<String>> {
        let record = self.normalise(record)?;
        let record = record.trim_end_matches(self.separator.as_str());
        Ok(cumulative_ids(record, &self.separator))
    }
}

impl Default for LabelRewriter {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_record_expansion() {
        let rewriter = LabelRewriter::default();
        assert_eq!(
            rewriter.to_path("k__Bacteria; p__Firmicutes").unwrap(),
            vec!["sk__Bacteria", "k__Bacteria", "p__Firmicutes"]
        );
    }

    #[test]
    fn test_modern_record_untouched() {
        assert_eq!(
            fix_legacy_labels("sk__Archaea;k__;p__Euryarchaeota", ";"),
            "sk__Archaea;k__;p__Euryarchaeota"
        );
        assert_eq!(fix_legacy_labels("k__Fungi", ";"), "sk__Fungi;k__Fungi");
    }

    #[test]
    fn test_split_path_drops_empty_segments() {
        assert_eq!(split_path("a;;b;", ";"), vec!["a", "b"]);
        assert!(split_path("", ";").is_empty());
    }

    #[test]
    fn test_cumulative_ids() {
        let ids = cumulative_ids("sk__Bacteria;k__;p__Firmicutes", ";");
        assert_eq!(
            ids,
            vec![
                "sk__Bacteria",
                "sk__Bacteria;k__Firmicutes",
                "sk__Bacteria;k__Firmicutes;p__Firmicutes",
            ]
        );
    }

    #[test]
    fn test_id_path_through_rewriter() {
        let rewriter = LabelRewriter::default();
        let ids = rewriter.to_id_path("k__Bacteria; p__Firmicutes;").unwrap();
        assert_eq!(
            ids,
            vec![
                "sk__Bacteria",
                "sk__Bacteria;k__Bacteria",
                "sk__Bacteria;k__Bacteria;p__Firmicutes",
            ]
        );
        assert!(matches!(rewriter.to_path("  "), Err(TaxoTreeError::MalformedPath(_))));
    }

    #[test]
    fn test_rank_name() {
        assert_eq!(rank_name("g__Bacillus"), "Bacillus");
        assert_eq!(rank_name("plain"), "plain");
        assert_eq!(rank_name("s__"), "");
    }

    #[test]
    fn test_legacy_fix_with_custom_separator() {
        assert_eq!(
            fix_legacy_labels("k__Bacteria| p__Firmicutes", "|"),
            "sk__Bacteria|k__Bacteria|p__Firmicutes"
        );

        let rewriter = LabelRewriter::new("|");
        assert_eq!(
            rewriter.to_path("k__Bacteria|p__Firmicutes").unwrap(),
            vec!["sk__Bacteria", "k__Bacteria", "p__Firmicutes"]
        );
        assert_eq!(
            rewriter.to_id_path("k__Bacteria| p__Firmicutes").unwrap(),
            vec![
                "sk__Bacteria",
                "sk__Bacteria|k__Bacteria",
                "sk__Bacteria|k__Bacteria|p__Firmicutes",
            ]
        );
    }

    #[test]
    fn test_to_path_fills_empty_ranks() {
        let rewriter = LabelRewriter::default();
        assert_eq!(
            rewriter.to_path("sk__Archaea;k__;p__Euryarchaeota").unwrap(),
            vec!["sk__Archaea", "k__Euryarchaeota", "p__Euryarchaeota"]
        );
        assert_eq!(
            fill_empty_ranks(&["sk__Bacteria", "k__", "p__Firmicutes"]),
            vec!["sk__Bacteria", "k__Firmicutes", "p__Firmicutes"]
        );
    }

    #[test]
    fn test_without_legacy_fix() {
        let rewriter = LabelRewriter::new("|").without_legacy_fix();
        assert_eq!(rewriter.to_path("k__A|p__B").unwrap(), vec!["k__A", "p__B"]);
    }
}
