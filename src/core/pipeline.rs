//! Template construction and per-sample encoding

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use super::config::PipelineConfig;
use crate::io::{save_paths_to_csv, save_to_file};
use crate::loader::{DataLoader, ErrorList, Sample};
use crate::matrix::{stack_matrices, SampleBatch};
use crate::select::{ImportanceModel, Selector};
use crate::tree::TaxTree;
use crate::utils::timing::Timer;
use crate::Result;

/// Separator between the ranks of a biome name
const BIOME_SEPARATOR: char = ':';

/// Turns loaded samples into a stack of same-shaped matrices.
///
/// A template tree holding every path seen in any sample fixes the matrix
/// layout; each sample is then encoded on its own copy of the template.
#[derive(Clone, Debug)]
pub struct TaxonomyPipeline {
    config: PipelineConfig,
}

impl TaxonomyPipeline {
    /// Create a pipeline from a validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(TaxonomyPipeline { config })
    }

    /// Pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Discover tables below `dir` with the configured loader settings
    pub fn loader<P: AsRef<Path>>(&self, dir: P) -> Result<DataLoader> {
        DataLoader::new(dir, self.config.loader.clone())
    }

    /// Tree path of one taxonomy record
    pub fn record_path(&self, record: &str) -> Result<Vec<String>> {
        if self.config.encoder.cumulative_ids {
            self.config.labels.to_id_path(record)
        } else {
            self.config.labels.to_path(record)
        }
    }

    /// Build the tree of every path in `samples`, pruned to `max_level`
    pub fn build_template(&self, samples: &[Sample]) -> Result<TaxTree> {
        let _timer = Timer::new("building template");
        let mut paths = Vec::new();
        for sample in samples {
            for record in &sample.records {
                paths.push(self.record_path(&record.taxonomy)?);
            }
        }

        let mut template = TaxTree::from_path_list(&paths)?;
        if let Some(level) = self.config.encoder.max_level {
            template.remove_levels(level)?;
        }

        log::info!(
            "template has {} nodes, {} leaves, depth {}",
            template.size(),
            template.leaf_count(),
            template.depth()
        );
        Ok(template)
    }

    /// Encode one sample on a copy of `template`.
    ///
    /// Each record's count goes to the deepest node of its path that the
    /// template holds; records with no such node are skipped.
    pub fn encode_sample(&self, template: &TaxTree, sample: &Sample) -> Result<Array2<f32>> {
        let mut counts: HashMap<String, f64> = HashMap::new();
        for record in &sample.records {
            let path = self.record_path(&record.taxonomy)?;
            match path.iter().rev().find(|id| template.contains(id)) {
                Some(id) => *counts.entry(id.clone()).or_insert(0.0) += record.count,
                None => log::trace!("{}: no template node for {}", sample.path.display(), record.taxonomy),
            }
        }

        let mut tree = template.clone();
        tree.init_nodes_data(0.0);
        tree.fill_with(counts)?;
        tree.update_value();
        tree.get_matrix_f32()
    }

    /// Encode every sample and attach the biome labels
    pub fn encode_samples(&self, samples: &[Sample]) -> Result<(TaxTree, SampleBatch)> {
        let template = self.build_template(samples)?;

        let _timer = Timer::new("encoding samples");
        let matrices: Vec<Array2<f32>> = samples
            .par_iter()
            .map(|sample| self.encode_sample(&template, sample))
            .collect::<Result<_>>()?;

        let batch = SampleBatch::new(stack_matrices(&matrices)?, biome_labels(samples))?;
        log::info!("encoded {} samples into {:?}", batch.len(), batch.matrices.shape());
        Ok((template, batch))
    }

    /// Load every kept table the loader found and encode it
    pub fn run(&self, loader: &DataLoader, errors: &ErrorList) -> Result<(TaxTree, SampleBatch)> {
        let samples = loader.get_data(errors)?;
        log::info!("loaded {} samples ({} excluded)", samples.len(), errors.len());
        self.encode_samples(&samples)
    }

    /// Write the template snapshot (`template.tree`) and its paths (`paths.csv`)
    pub fn export_template<P: AsRef<Path>>(&self, template: &TaxTree, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        save_to_file(template, dir.join("template.tree"))?;
        save_paths_to_csv(template, dir.join("paths.csv"), &self.config.encoder.csv_fill)
    }

    /// Run both selections with the configured coefficients.
    ///
    /// Returns the paths kept by the abundance threshold and by the
    /// importance threshold, in that order.
    pub fn select<M>(
        &self,
        batch: &SampleBatch,
        targets: &Array1<f32>,
        model: &M,
    ) -> Result<(Array1<bool>, Array1<bool>)>
    where
        M: ImportanceModel + ?Sized,
    {
        let mut selector = Selector::new(batch.matrices.clone());
        let basic = selector.run_basic_select(self.config.selector.basic_coefficient).clone();
        selector.cal_feature_importance(targets.view(), model)?;
        let important = selector
            .run_importance_select(self.config.selector.importance_coefficient)?
            .clone();
        Ok((basic, important))
    }
}

/// `label_i` holds rank `i` of each sample's biome, `""` past its end
pub fn biome_labels(samples: &[Sample]) -> BTreeMap<String, Vec<String>> {
    let ranks: Vec<Vec<&str>> = samples
        .iter()
        .map(|sample| sample.biome.split(BIOME_SEPARATOR).collect())
        .collect();
    let depth = ranks.iter().map(Vec::len).max().unwrap_or(0);

    (0..depth)
        .map(|level| {
            let values = ranks
                .iter()
                .map(|r| r.get(level).map(|s| s.to_string()).unwrap_or_default())
                .collect();
            (format!("label_{}", level), values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::AbundanceRecord;
    use crate::select::CorrelationImportance;
    use ndarray::array;
    use std::path::PathBuf;

    fn sample(biome: &str, records: &[(&str, f64, &str)]) -> Sample {
        Sample {
            path: PathBuf::from(biome).join("s.tsv"),
            biome: biome.to_string(),
            records: records
                .iter()
                .map(|(otu, count, taxonomy)| AbundanceRecord {
                    otu_id: otu.to_string(),
                    count: *count,
                    taxonomy: taxonomy.to_string(),
                })
                .collect(),
        }
    }

    fn samples() -> Vec<Sample> {
        vec![
            sample("root:Host:Gut", &[("1", 2.0, "k__Bacteria; p__Firmicutes")]),
            sample(
                "root:Soil",
                &[
                    ("1", 5.0, "k__Bacteria; p__Firmicutes"),
                    ("2", 3.0, "k__Bacteria; p__Proteobacteria"),
                ],
            ),
        ]
    }

    #[test]
    fn test_encode_samples() {
        let pipeline = TaxonomyPipeline::new(PipelineConfig::default()).unwrap();
        let (template, batch) = pipeline.encode_samples(&samples()).unwrap();

        assert_eq!(template.depth(), 3);
        assert_eq!(template.leaf_count(), 2);
        assert_eq!(batch.matrices.dim(), (2, 2, 4));

        let gut: Array2<f32> = array![[2.0, 2.0, 2.0, 2.0], [2.0, 2.0, 2.0, 0.0]];
        let soil: Array2<f32> = array![[8.0, 8.0, 8.0, 5.0], [8.0, 8.0, 8.0, 3.0]];
        assert_eq!(batch.matrices.index_axis(ndarray::Axis(0), 0), gut);
        assert_eq!(batch.matrices.index_axis(ndarray::Axis(0), 1), soil);

        assert_eq!(batch.labels["label_0"], vec!["root", "root"]);
        assert_eq!(batch.labels["label_1"], vec!["Host", "Soil"]);
        assert_eq!(batch.labels["label_2"], vec!["Gut", ""]);
    }

    #[test]
    fn test_max_level_moves_counts_up() {
        let mut config = PipelineConfig::default();
        config.encoder.max_level = Some(3);
        let pipeline = TaxonomyPipeline::new(config).unwrap();
        let (template, batch) = pipeline.encode_samples(&samples()).unwrap();

        assert_eq!(template.depth(), 2);
        assert_eq!(batch.matrices.dim(), (2, 1, 3));
        assert_eq!(batch.matrices[[1, 0, 2]], 8.0);
    }

    #[test]
    fn test_bare_labels_with_empty_ranks() {
        let mut config = PipelineConfig::for_current_tables();
        config.encoder.cumulative_ids = false;
        let pipeline = TaxonomyPipeline::new(config).unwrap();

        let samples = vec![
            sample("root:Marine", &[("1", 1.0, "sk__Archaea;k__;p__Euryarchaeota")]),
            sample("root:Soil", &[("1", 4.0, "sk__Bacteria;k__;p__Firmicutes")]),
        ];
        let (template, batch) = pipeline.encode_samples(&samples).unwrap();

        assert_eq!(template.parent("k__Euryarchaeota").unwrap(), Some("sk__Archaea"));
        assert_eq!(template.parent("k__Firmicutes").unwrap(), Some("sk__Bacteria"));
        assert_eq!(batch.matrices.dim(), (2, 2, 4));
        assert_eq!(batch.matrices[[0, 0, 3]], 1.0);
        assert_eq!(batch.matrices[[1, 1, 3]], 4.0);
        assert_eq!(batch.matrices[[1, 0, 0]], 4.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PipelineConfig::default();
        config.loader.extension.clear();
        assert!(TaxonomyPipeline::new(config).is_err());
    }

    #[test]
    fn test_run_from_directory() {
        use crate::loader::fixtures::write_table;

        let dir = std::env::temp_dir().join("taxo_tree_test_pipeline_run");
        std::fs::remove_dir_all(&dir).ok();
        let soil = dir.join("root:Soil");
        std::fs::create_dir_all(&soil).unwrap();
        let header = "# OTU ID\tERR1\ttaxonomy";
        write_table(&soil.join("a.tsv"), header, &[("1", "4", "k__Bacteria; p__Firmicutes")]);
        write_table(&soil.join("b.tsv"), header, &[("1", "0", "k__Bacteria; p__Firmicutes")]);

        let pipeline = TaxonomyPipeline::new(PipelineConfig::default()).unwrap();
        let loader = pipeline.loader(&dir).unwrap();
        let errors = loader.error_list();
        assert_eq!(errors.len(), 1);

        let (template, batch) = pipeline.run(&loader, &errors).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.matrices[[0, 0, 3]], 4.0);

        let out = dir.join("out");
        pipeline.export_template(&template, &out).unwrap();
        assert_eq!(crate::io::load_from_file(out.join("template.tree")).unwrap(), template);
        assert!(out.join("paths.csv").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_select() {
        let pipeline = TaxonomyPipeline::new(PipelineConfig::default()).unwrap();
        let (_, batch) = pipeline.encode_samples(&samples()).unwrap();
        let targets = array![0.0f32, 1.0];
        let (basic, important) = pipeline
            .select(&batch, &targets, &CorrelationImportance)
            .unwrap();
        assert_eq!(basic.len(), 2);
        assert_eq!(important.len(), 2);
        assert!(basic.iter().all(|&kept| kept));
    }
}
