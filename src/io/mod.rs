//! Snapshot and path export I/O

mod snapshot;
mod paths_csv;

pub use snapshot::{load, load_from_file, save, save_to_file, SNAPSHOT_VERSION};
pub use paths_csv::{load_paths_from_csv, read_paths, save_paths_to_csv, write_paths};
