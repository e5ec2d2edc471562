//! # taxo-tree: taxonomy trees as dense matrices
//!
//! This library maintains a labeled hierarchical tree built from
//! classification paths (e.g. `sk__Bacteria;k__Bacteria;p__Firmicutes`)
//! and turns it into fixed-width numeric matrices that statistical and
//! machine-learning code can consume directly.
//!
//! ## Features
//!
//! - **Tree engine**: identifier-indexed node store, construction from label
//!   paths, breadth-first and root-to-leaf traversals, bottom-up aggregation,
//!   level pruning
//! - **Matrix encoding**: one row per leaf path, one column per level, with
//!   `.npy` output and stacking of per-sample matrices
//! - **Snapshots**: checksummed binary snapshots of whole trees
//! - **Data loading**: discovery and sanity checks of abundance tables
//! - **Feature selection**: threshold and importance-based row selection

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Node store and tree engine
pub mod tree;

/// Path to matrix encoding
pub mod matrix;

/// Snapshot and path export I/O
pub mod io;

/// Label normalisation and identifier construction
pub mod labels;

/// Discovery, validation and reading of abundance tables
pub mod loader;

/// Feature selection over stacked matrices
pub mod select;

/// Configuration and the end-to-end pipeline
pub mod core;

/// Utility functions and helpers
pub mod utils;

// Re-export commonly used types
pub use tree::{Node, NodeStore, TaxTree, ROOT_ID};
pub use matrix::{stack_matrices, SampleBatch};
pub use crate::core::{PipelineConfig, TaxonomyPipeline};

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum TaxoTreeError {
    /// Identifier already present during creation
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// Lookup or update on an absent identifier
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Creation referencing a parent that does not exist
    #[error("Unknown parent: {0}")]
    UnknownParent(String),

    /// Empty path, or a path that cannot be rooted
    #[error("Malformed path: {0}")]
    MalformedPath(String),

    /// Snapshot bytes are corrupt or incompatible
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Matrix encoding found an inconsistent tree or mismatched shapes
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Abundance table that cannot be parsed
    #[error("Malformed table: {0}")]
    MalformedTable(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Importance model failure or mismatched model output
    #[error("Model error: {0}")]
    Model(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited table error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the library
pub type Result<T> = std::result::Result<T, TaxoTreeError>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        core::{PipelineConfig, TaxonomyPipeline},
        io::{load, save},
        labels::LabelRewriter,
        matrix::{stack_matrices, SampleBatch},
        tree::{TaxTree, ROOT_ID},
        Result, TaxoTreeError,
    };
}
