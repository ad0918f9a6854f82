use crate::adapters::readers::{read_bio_file, read_json_lines};
use crate::app::pipelines::{make_rng, path_str, to_json_lines};
use crate::config::AddSamplesArgs;
use crate::core::{AnnotationItem, Pipeline, RawRecord, Storage};
use crate::domain::services::candidates::{sample, CandidateBuilder};
use crate::domain::services::join::{join_characters, value_as_id};
use crate::utils::error::Result;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ExistingAndSources {
    pub used_ids: HashSet<String>,
    pub existing_count: usize,
    pub model_outputs: Vec<RawRecord>,
    pub bios: Vec<RawRecord>,
}

#[derive(Debug, Clone)]
pub struct NewSamples {
    pub items: Vec<AnnotationItem>,
    pub existing_count: usize,
}

/// Appends characters that are not yet in an annotation data file.
pub struct AddSamplesPipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) args: AddSamplesArgs,
}

impl<S: Storage> AddSamplesPipeline<S> {
    pub fn new(storage: S, args: AddSamplesArgs) -> Self {
        Self { storage, args }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for AddSamplesPipeline<S> {
    type Extracted = ExistingAndSources;
    type Transformed = NewSamples;

    fn name(&self) -> &'static str {
        "add-samples"
    }

    async fn extract(&self) -> Result<ExistingAndSources> {
        let existing_path = path_str(&self.args.existing_file);
        tracing::info!("Loading existing annotations from {}...", existing_path);
        let existing = read_json_lines(&self.storage, &existing_path).await?;
        let used_ids: HashSet<String> = existing
            .iter()
            .filter_map(|item| value_as_id(item.get("id")))
            .collect();
        tracing::info!("Found {} existing samples", used_ids.len());

        let model_path = path_str(&self.args.model_outputs);
        tracing::info!("Loading model outputs from {}...", model_path);
        let model_outputs = read_json_lines(&self.storage, &model_path).await?;

        let bio_path = path_str(&self.args.bio_file());
        tracing::info!("Loading bios from {}...", bio_path);
        let bios = read_bio_file(&self.storage, &bio_path).await?;

        Ok(ExistingAndSources {
            used_ids,
            existing_count: existing.len(),
            model_outputs,
            bios,
        })
    }

    async fn transform(&self, data: ExistingAndSources) -> Result<NewSamples> {
        let joined = join_characters(&data.bios, &data.model_outputs, &data.used_ids);
        tracing::info!(
            "Found {} available characters (excluding already-used ones)",
            joined.entries.len()
        );

        let mut rng = make_rng(self.args.seed);

        let sampled = if joined.entries.len() < self.args.num_samples {
            tracing::warn!(
                "Only {} available characters, but {} requested. Using all available.",
                joined.entries.len(),
                self.args.num_samples
            );
            joined.entries.clone()
        } else {
            tracing::info!("Sampling {} characters.", self.args.num_samples);
            sample(&joined.entries, self.args.num_samples, &mut rng)
        };

        let builder = CandidateBuilder::new(self.args.candidate_pool_size, true);
        let items = sampled
            .iter()
            .map(|entry| builder.build_item(entry, &joined.keyword_pool, &mut rng))
            .collect();

        Ok(NewSamples {
            items,
            existing_count: data.existing_count,
        })
    }

    async fn load(&self, result: NewSamples) -> Result<String> {
        let path = path_str(&self.args.existing_file);
        tracing::info!("Appending {} new samples to {}...", result.items.len(), path);

        let data = to_json_lines(&result.items)?;
        self.storage.append_file(&path, &data).await?;

        tracing::info!(
            "✅ Successfully added {} new samples. Total samples: {}",
            result.items.len(),
            result.existing_count + result.items.len()
        );
        Ok(path)
    }
}
