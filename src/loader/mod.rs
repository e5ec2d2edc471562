//! Discovery, validation and reading of abundance tables
//!
//! Tables live one directory below the data root, grouped by biome:
//!
//! ```text
//! data/
//!   root:Host-associated:Human/
//!     ERR1.tsv
//!   root:Environmental:Terrestrial:Soil/
//!     ERR2.tsv
//! ```
//!
//! Files that fail [`DataLoader::check_data`] go into an [`ErrorList`],
//! which callers pass back in when loading.

mod checks;
mod table;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use rayon::prelude::*;
use crate::core::LoaderConfig;
use crate::{Result, TaxoTreeError};

pub use checks::{ErrorList, FileStatus, ValueCheck};
pub use table::{read_raw_table, read_table, AbundanceRecord, RawTable};
#[cfg(test)]
pub(crate) use table::fixtures;

/// One loaded table
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// File the sample was read from
    pub path: PathBuf,
    /// Name of the biome directory
    pub biome: String,
    /// Abundance records
    pub records: Vec<AbundanceRecord>,
}

/// Split items into consecutive batches of `batch_size`; the last may be short
pub fn split_batches<T: Clone>(items: &[T], batch_size: usize) -> Result<Vec<Vec<T>>> {
    if batch_size == 0 {
        return Err(TaxoTreeError::InvalidConfig("batch size must be positive".to_string()));
    }
    Ok(items.chunks(batch_size).map(<[T]>::to_vec).collect())
}

/// Name of the directory holding a file
pub fn biome_of(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Finds and reads abundance tables below a data directory
#[derive(Clone, Debug)]
pub struct DataLoader {
    config: LoaderConfig,
    paths: Vec<PathBuf>,
}

impl DataLoader {
    /// Discover tables below `dir`, keeping only the configured batch
    pub fn new<P: AsRef<Path>>(dir: P, config: LoaderConfig) -> Result<Self> {
        let paths = discover_files(dir.as_ref(), &config.extension)?;

        let paths = match (config.batch_size, config.batch_index) {
            (Some(size), Some(index)) => {
                let n_files = paths.len();
                split_batches(&paths, size)?.into_iter().nth(index).ok_or_else(|| {
                    TaxoTreeError::InvalidConfig(format!(
                        "batch {} out of range for {} files in batches of {}",
                        index, n_files, size
                    ))
                })?
            }
            _ => paths,
        };

        log::info!("found {} tables below {}", paths.len(), dir.as_ref().display());
        Ok(DataLoader { config, paths })
    }

    /// Create a loader over an explicit list of files
    pub fn from_paths(paths: Vec<PathBuf>, config: LoaderConfig) -> Self {
        DataLoader { config, paths }
    }

    /// Discovered files
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Loader configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Run the sanity checks on every file
    pub fn check_data(&self) -> BTreeMap<PathBuf, FileStatus> {
        let statuses: BTreeMap<PathBuf, FileStatus> = self
            .paths
            .par_iter()
            .map(|path| {
                let status = match read_raw_table(path, &self.config) {
                    Ok(table) => FileStatus::of_table(&table),
                    Err(e) => FileStatus::Unreadable(e.to_string()),
                };
                (path.clone(), status)
            })
            .collect();

        for (path, status) in statuses.iter().filter(|(_, s)| !s.is_ok()) {
            log::warn!("rejecting {}: {}", path.display(), status);
        }
        statuses
    }

    /// Check every file and collect the failures
    pub fn error_list(&self) -> ErrorList {
        ErrorList::from_statuses(&self.check_data())
    }

    /// Files not named in `errors`
    pub fn paths_keep(&self, errors: &ErrorList) -> Vec<PathBuf> {
        self.paths
            .iter()
            .filter(|path| !errors.contains(path))
            .cloned()
            .collect()
    }

    /// Number of kept files per biome
    pub fn sample_count(&self, errors: &ErrorList) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for path in self.paths_keep(errors) {
            *counts.entry(biome_of(&path)).or_insert(0) += 1;
        }
        counts
    }

    /// Read every kept file
    pub fn get_data(&self, errors: &ErrorList) -> Result<Vec<Sample>> {
        let _timer = crate::utils::timing::Timer::new("loading tables");
        self.paths_keep(errors)
            .into_iter()
            .map(|path| {
                let records = read_table(&path, &self.config)?;
                Ok(Sample {
                    biome: biome_of(&path),
                    path,
                    records,
                })
            })
            .collect()
    }
}

/// Files ending in `extension` inside each sub-directory of `dir`, sorted
fn discover_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut biomes = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            biomes.push(path);
        }
    }
    biomes.sort();

    let mut files = Vec::new();
    for biome in biomes {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(&biome)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(extension));
            if path.is_file() && matches {
                found.push(path);
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}
