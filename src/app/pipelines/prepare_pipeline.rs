use crate::adapters::readers::{read_bio_file, read_json_lines};
use crate::app::pipelines::{make_rng, path_str, to_json_lines};
use crate::config::PrepareArgs;
use crate::core::{AnnotationItem, Pipeline, RawRecord, Storage};
use crate::domain::services::candidates::{sample, CandidateBuilder};
use crate::domain::services::join::join_characters;
use crate::utils::error::Result;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct SourceRecords {
    pub model_outputs: Vec<RawRecord>,
    pub bios: Vec<RawRecord>,
}

/// Builds the annotation data file from model outputs and biographies.
pub struct PreparePipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) args: PrepareArgs,
}

impl<S: Storage> PreparePipeline<S> {
    pub fn new(storage: S, args: PrepareArgs) -> Self {
        Self { storage, args }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for PreparePipeline<S> {
    type Extracted = SourceRecords;
    type Transformed = Vec<AnnotationItem>;

    fn name(&self) -> &'static str {
        "prepare"
    }

    async fn extract(&self) -> Result<SourceRecords> {
        let model_path = path_str(&self.args.model_outputs);
        tracing::info!("Loading model outputs from {}...", model_path);
        let model_outputs = read_json_lines(&self.storage, &model_path).await?;

        let bio_path = path_str(&self.args.bio_file());
        tracing::info!("Loading bios from {}...", bio_path);
        let bios = read_bio_file(&self.storage, &bio_path).await?;

        Ok(SourceRecords {
            model_outputs,
            bios,
        })
    }

    async fn transform(&self, data: SourceRecords) -> Result<Vec<AnnotationItem>> {
        let joined = join_characters(&data.bios, &data.model_outputs, &HashSet::new());
        tracing::info!("Matched {} characters with model outputs.", joined.entries.len());

        let mut rng = make_rng(self.args.seed);

        let sampled = if joined.entries.len() > self.args.sample_size {
            tracing::info!("Sampling {} characters.", self.args.sample_size);
            sample(&joined.entries, self.args.sample_size, &mut rng)
        } else {
            joined.entries.clone()
        };

        let builder = CandidateBuilder::new(
            self.args.candidate_pool_size,
            self.args.include_none_option,
        );

        Ok(sampled
            .iter()
            .map(|entry| builder.build_item(entry, &joined.keyword_pool, &mut rng))
            .collect())
    }

    async fn load(&self, result: Vec<AnnotationItem>) -> Result<String> {
        let output = path_str(&self.args.output);
        let data = to_json_lines(&result)?;
        self.storage.write_file(&output, &data).await?;

        tracing::info!("✅ Successfully wrote {} items to {}", result.len(), output);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AnnotateError;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &str) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                AnnotateError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn append_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .await
                .entry(path.to_string())
                .or_default()
                .extend_from_slice(data);
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }
    }

    const MODEL_OUTPUTS: &str = r#"{"character_json": "c1.json", "personality_keywords": {"English": ["brave", "loyal"]}}
{"character_json": "c2.json", "personality_keywords": {"English": ["shy"]}}
{"character_json": "c3.json", "personality_keywords": {"English": []}}
"#;

    const BIOS: &str = r#"{"character_json": "c1.json", "character_name": "Diluc", "biography": "Owns a winery."}
{"character_json": "c2.json", "character_name": "Qiqi", "biography": "Forgets things."}
{"character_json": "c3.json", "character_name": "Ghost", "biography": "No keywords."}
{"character_json": "c4.json", "character_name": "Nobody", "biography": "No model output."}
"#;

    fn args() -> PrepareArgs {
        PrepareArgs {
            model_outputs: PathBuf::from("model_outputs/out.jsonl"),
            output: PathBuf::from("data/keyword_annotation.jsonl"),
            candidate_pool_size: 3,
            seed: Some(11),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_extract_reads_default_bio_file() {
        let storage = MockStorage::default();
        storage.put("model_outputs/out.jsonl", MODEL_OUTPUTS).await;
        storage.put("model_outputs/char_bio_merged.jsonl", BIOS).await;
        let pipeline = PreparePipeline::new(storage, args());

        let records = pipeline.extract().await.unwrap();

        assert_eq!(records.model_outputs.len(), 3);
        assert_eq!(records.bios.len(), 4);
    }

    #[tokio::test]
    async fn test_transform_builds_items_for_matched_characters() {
        let storage = MockStorage::default();
        storage.put("model_outputs/out.jsonl", MODEL_OUTPUTS).await;
        storage.put("model_outputs/char_bio_merged.jsonl", BIOS).await;
        let pipeline = PreparePipeline::new(storage, args());

        let records = pipeline.extract().await.unwrap();
        let items = pipeline.transform(records).await.unwrap();

        assert_eq!(items.len(), 2);
        let diluc = items.iter().find(|i| i.id == "c1.json").unwrap();
        assert_eq!(diluc.text, "<h1>Diluc</h1><p>Owns a winery.</p>");
        assert_eq!(diluc.model_keywords, vec!["brave", "loyal"]);
        let mut candidates = diluc.candidates.clone();
        candidates.sort();
        assert_eq!(candidates, vec!["brave", "loyal", "shy"]);
    }

    #[tokio::test]
    async fn test_transform_samples_down_to_sample_size() {
        let storage = MockStorage::default();
        let mut prepare_args = args();
        prepare_args.sample_size = 1;
        let pipeline = PreparePipeline::new(storage, prepare_args);

        let records = SourceRecords {
            model_outputs: crate::adapters::readers::parse_json_lines("m", MODEL_OUTPUTS.as_bytes())
                .unwrap(),
            bios: crate::adapters::readers::parse_json_lines("b", BIOS.as_bytes()).unwrap(),
        };
        let items = pipeline.transform(records).await.unwrap();

        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_load_writes_json_lines() {
        let storage = MockStorage::default();
        let pipeline = PreparePipeline::new(storage.clone(), args());
        let items = vec![AnnotationItem {
            id: "c1.json".to_string(),
            text: "<h1>Diluc</h1><p>Owns a winery.</p>".to_string(),
            candidates: vec!["brave".to_string()],
            model_keywords: vec!["brave".to_string()],
        }];

        let output = pipeline.load(items).await.unwrap();

        assert_eq!(output, "data/keyword_annotation.jsonl");
        let written = String::from_utf8(storage.get_file(&output).await.unwrap()).unwrap();
        assert_eq!(
            written,
            "{\"id\":\"c1.json\",\"text\":\"<h1>Diluc</h1><p>Owns a winery.</p>\",\"candidates\":[\"brave\"],\"model_keywords\":[\"brave\"]}\n"
        );
    }

    #[tokio::test]
    async fn test_extract_rejects_unknown_bio_format() {
        let storage = MockStorage::default();
        storage.put("model_outputs/out.jsonl", MODEL_OUTPUTS).await;
        let mut prepare_args = args();
        prepare_args.bio_file = Some(PathBuf::from("bios.xlsx"));
        let pipeline = PreparePipeline::new(storage, prepare_args);

        assert!(matches!(
            pipeline.extract().await,
            Err(AnnotateError::UnsupportedFormatError { .. })
        ));
    }
}
