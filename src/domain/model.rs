use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 候選清單最後附加的選項，標註時代表「沒有任何有效關鍵字」
pub const NONE_OF_THE_ABOVE: &str = "None of the above";

/// 任意 JSON 物件列（來自 JSONL、JSON 陣列或 CSV 行）
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// One model, one annotation server configuration, one output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationTarget {
    pub name: String,
    pub model: String,
    pub config: PathBuf,
    pub port: u16,
    pub output_dir: PathBuf,
}

impl AnnotationTarget {
    pub fn access_url(&self, host: &str) -> String {
        access_url(host, self.port)
    }
}

pub fn access_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

/// A character whose biography was matched with model keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterEntry {
    pub id: String,
    pub name: String,
    pub biography: String,
    pub model_keywords: Vec<String>,
}

impl CharacterEntry {
    pub fn display_text(&self) -> String {
        format!("<h1>{}</h1><p>{}</p>", self.name, self.biography)
    }
}

/// One line of the data file the annotation server reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationItem {
    pub id: String,
    pub text: String,
    pub candidates: Vec<String>,
    pub model_keywords: Vec<String>,
}

/// Joined characters plus the keyword pool distractors are drawn from.
#[derive(Debug, Clone, Default)]
pub struct JoinedCharacters {
    pub entries: Vec<CharacterEntry>,
    pub keyword_pool: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlapMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub jaccard: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub precision_mean: f64,
    pub precision_std: f64,
    pub recall_mean: f64,
    pub recall_std: f64,
    pub f1_mean: f64,
    pub f1_std: f64,
    pub jaccard_mean: f64,
    pub jaccard_std: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceOverlap {
    pub instance_id: String,
    pub model_keywords: Vec<String>,
    pub annotated_keywords: Vec<String>,
    pub metrics: OverlapMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserOverlap {
    pub total_instances: usize,
    #[serde(serialize_with = "empty_object_if_none")]
    pub aggregate_metrics: Option<AggregateMetrics>,
    pub per_instance: Vec<InstanceOverlap>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallOverlap {
    pub total_instances: usize,
    #[serde(serialize_with = "empty_object_if_none")]
    pub aggregate_metrics: Option<AggregateMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlapReport {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub overall: OverallOverlap,
    pub per_user: BTreeMap<String, UserOverlap>,
}

// 沒有任何實例時輸出 `{}`
fn empty_object_if_none<S: Serializer>(
    value: &Option<AggregateMetrics>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(metrics) => metrics.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text_wraps_name_and_biography() {
        let entry = CharacterEntry {
            id: "c1".to_string(),
            name: "Ayaka".to_string(),
            biography: "A calm swordswoman.".to_string(),
            model_keywords: vec!["calm".to_string()],
        };
        assert_eq!(
            entry.display_text(),
            "<h1>Ayaka</h1><p>A calm swordswoman.</p>"
        );
    }

    #[test]
    fn test_missing_aggregate_serializes_as_empty_object() {
        let overall = OverallOverlap {
            total_instances: 0,
            aggregate_metrics: None,
        };
        let json = serde_json::to_value(&overall).unwrap();
        assert_eq!(json["aggregate_metrics"], serde_json::json!({}));
    }
}
