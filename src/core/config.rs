//! Pipeline configuration

use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::labels::LabelRewriter;
use crate::{Result, TaxoTreeError};

/// Where and how abundance tables are read
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// File extension of abundance tables
    pub extension: String,
    /// Zero-based line holding the column header
    pub header_row: usize,
    /// Field delimiter
    pub delimiter: char,
    /// Split discovered files into batches of this size
    pub batch_size: Option<usize>,
    /// Keep only this batch
    pub batch_index: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            extension: ".tsv".to_string(),
            header_row: 1,
            delimiter: '\t',
            batch_size: None,
            batch_index: None,
        }
    }
}

/// How trees are turned into matrices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Use cumulative identifiers (`a`, `a;b`, ...) instead of bare labels
    pub cumulative_ids: bool,
    /// Prune the template tree to levels below this one
    pub max_level: Option<usize>,
    /// Padding for short paths in the path export
    pub csv_fill: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            cumulative_ids: true,
            max_level: None,
            csv_fill: String::new(),
        }
    }
}

/// Thresholds of the feature selection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Coefficient on the column mean for the abundance threshold
    pub basic_coefficient: f32,
    /// Coefficient on the column mean for the importance threshold
    pub importance_coefficient: f32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            basic_coefficient: 0.001,
            importance_coefficient: 0.1,
        }
    }
}

/// Full pipeline configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Table discovery and parsing
    pub loader: LoaderConfig,
    /// Record to path conversion
    pub labels: LabelRewriter,
    /// Tree to matrix conversion
    pub encoder: EncoderConfig,
    /// Feature selection thresholds
    pub selector: SelectorConfig,
}

impl PipelineConfig {
    /// Config for tables exported before the superkingdom rank existed
    pub fn for_legacy_tables() -> Self {
        PipelineConfig::default()
    }

    /// Config for tables that already start at the superkingdom rank
    pub fn for_current_tables() -> Self {
        PipelineConfig {
            labels: LabelRewriter::default().without_legacy_fix(),
            ..PipelineConfig::default()
        }
    }

    /// Config for a single batch of `batch_size` files
    pub fn for_batch(batch_size: usize, batch_index: usize) -> Self {
        let mut config = PipelineConfig::default();
        config.loader.batch_size = Some(batch_size);
        config.loader.batch_index = Some(batch_index);
        config
    }

    /// Load a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: PipelineConfig = crate::utils::load_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.loader.extension.is_empty() {
            return Err(invalid("file extension must not be empty"));
        }

        if !self.loader.delimiter.is_ascii() {
            return Err(invalid("delimiter must be an ASCII character"));
        }

        match (self.loader.batch_size, self.loader.batch_index) {
            (Some(0), _) => return Err(invalid("batch size must be positive")),
            (Some(_), None) | (None, Some(_)) => {
                return Err(invalid("batch size and batch index must be set together"));
            }
            _ => {}
        }

        if self.labels.separator.is_empty() {
            return Err(invalid("label separator must not be empty"));
        }

        if self.encoder.max_level == Some(0) {
            return Err(invalid("max level must keep the root"));
        }

        if self.selector.basic_coefficient < 0.0 || self.selector.importance_coefficient < 0.0 {
            return Err(invalid("selection coefficients must be non-negative"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> TaxoTreeError {
    TaxoTreeError::InvalidConfig(message.to_string())
}
