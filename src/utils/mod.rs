//! Utility functions for taxo-tree

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::Result;

/// Save object to JSON file
pub fn save_json<T: Serialize, P: AsRef<Path>>(obj: &T, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, obj)?;
    writer.flush()?;
    Ok(())
}

/// Load object from JSON file
pub fn load_json<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    let obj = serde_json::from_reader(reader)?;
    Ok(obj)
}

/// Generate random rank paths, e.g. for benchmarks.
///
/// Every path has `depth` labels; each rank picks one of `branching`
/// values, and labels carry their prefix so identifiers stay unique.
pub fn random_paths<R: rand::Rng>(rng: &mut R, n_paths: usize, depth: usize, branching: usize) -> Vec<Vec<String>> {
    let branching = branching.max(1);
    (0..n_paths)
        .map(|_| {
            let mut prefix = String::new();
            (0..depth)
                .map(|rank| {
                    let pick = rng.gen_range(0..branching);
                    if rank > 0 {
                        prefix.push(';');
                    }
                    prefix.push_str(&format!("r{}__{}", rank, pick));
                    prefix.clone()
                })
                .collect()
        })
        .collect()
}

/// Timing utilities
pub mod timing {
    use std::time::Instant;

    /// Logs the elapsed time of a scope at debug level when dropped
    pub struct Timer {
        start: Instant,
        name: String,
    }

    impl Timer {
        /// Start new timer
        pub fn new(name: &str) -> Self {
            Timer {
                start: Instant::now(),
                name: name.to_string(),
            }
        }

        /// Get elapsed time in seconds
        pub fn elapsed(&self) -> f32 {
            self.start.elapsed().as_secs_f32()
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            log::debug!("{}: {:.3}s", self.name, self.elapsed());
        }
    }
}
