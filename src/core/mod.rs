//! Configuration and the end-to-end pipeline from tables to matrices

mod config;
mod pipeline;

pub use config::{EncoderConfig, LoaderConfig, PipelineConfig, SelectorConfig};
pub use pipeline::{biome_labels, TaxonomyPipeline};
