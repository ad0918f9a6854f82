use crate::adapters::readers::read_json_lines;
use crate::app::pipelines::path_str;
use crate::config::OverlapPaths;
use crate::core::{Pipeline, RawRecord, Storage};
use crate::domain::model::{AggregateMetrics, OverallOverlap, OverlapMetrics, OverlapReport};
use crate::domain::services::join::value_as_id;
use crate::domain::services::metrics::{aggregate, user_overlap};
use crate::utils::error::Result;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct OverlapInput {
    pub original: Vec<RawRecord>,
    pub annotated: Vec<RawRecord>,
}

/// Scores annotated instances against the keywords the model produced.
pub struct OverlapPipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) paths: OverlapPaths,
}

impl<S: Storage> OverlapPipeline<S> {
    pub fn new(storage: S, paths: OverlapPaths) -> Self {
        Self { storage, paths }
    }
}

/// 統計摘要行，例如 `alice: Precision=0.500, Recall=...`
pub fn summary_line(label: &str, metrics: Option<&AggregateMetrics>) -> String {
    let (p, r, f, j) = metrics
        .map(|m| (m.precision_mean, m.recall_mean, m.f1_mean, m.jaccard_mean))
        .unwrap_or((0.0, 0.0, 0.0, 0.0));
    format!(
        "{}: Precision={:.3}, Recall={:.3}, F1={:.3}, Jaccard={:.3}",
        label, p, r, f, j
    )
}

pub fn build_report(original: &[RawRecord], annotated: &[RawRecord]) -> OverlapReport {
    let mut model_keywords: HashMap<String, BTreeSet<String>> = HashMap::new();
    for item in original {
        let Some(id) = value_as_id(item.get("id")) else {
            continue;
        };
        let keywords = item
            .get("model_keywords")
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        model_keywords.insert(id, keywords);
    }

    let mut by_user: BTreeMap<String, Vec<&RawRecord>> = BTreeMap::new();
    for instance in annotated {
        if let Some(user) = value_as_id(instance.get("user_id")) {
            by_user.entry(user).or_default().push(instance);
        }
    }

    let per_user: BTreeMap<_, _> = by_user
        .into_iter()
        .map(|(user, annotations)| (user, user_overlap(&annotations, &model_keywords)))
        .collect();

    let all: Vec<OverlapMetrics> = per_user
        .values()
        .flat_map(|u| u.per_instance.iter().map(|i| i.metrics))
        .collect();

    OverlapReport {
        generated_at: chrono::Utc::now(),
        overall: OverallOverlap {
            total_instances: per_user.values().map(|u| u.total_instances).sum(),
            aggregate_metrics: aggregate(&all),
        },
        per_user,
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for OverlapPipeline<S> {
    type Extracted = OverlapInput;
    type Transformed = OverlapReport;

    fn name(&self) -> &'static str {
        "overlap"
    }

    async fn extract(&self) -> Result<OverlapInput> {
        let original_path = path_str(&self.paths.original_data);
        let annotated_path = path_str(&self.paths.annotated_data);
        tracing::info!("Loading original data from {}...", original_path);
        let original = read_json_lines(&self.storage, &original_path).await?;
        tracing::info!("Loading annotations from {}...", annotated_path);
        let annotated = read_json_lines(&self.storage, &annotated_path).await?;

        Ok(OverlapInput {
            original,
            annotated,
        })
    }

    async fn transform(&self, data: OverlapInput) -> Result<OverlapReport> {
        let report = build_report(&data.original, &data.annotated);
        tracing::info!(
            "Scored {} instances from {} annotator(s)",
            report.overall.total_instances,
            report.per_user.len()
        );
        Ok(report)
    }

    async fn load(&self, result: OverlapReport) -> Result<String> {
        for (user, overlap) in &result.per_user {
            println!("{}", summary_line(user, overlap.aggregate_metrics.as_ref()));
        }
        println!();
        println!(
            "{}",
            summary_line("Overall", result.overall.aggregate_metrics.as_ref())
        );

        let output = path_str(&self.paths.output);
        let json = serde_json::to_string_pretty(&result)?;
        self.storage.write_file(&output, json.as_bytes()).await?;
        Ok(output)
    }
}
