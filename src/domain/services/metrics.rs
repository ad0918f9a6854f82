use crate::domain::model::{
    AggregateMetrics, InstanceOverlap, OverlapMetrics, RawRecord, UserOverlap, NONE_OF_THE_ABOVE,
};
use crate::domain::services::join::value_as_id;
use std::collections::{BTreeSet, HashMap};

pub fn compute_metrics(predicted: &BTreeSet<String>, actual: &BTreeSet<String>) -> OverlapMetrics {
    if predicted.is_empty() && actual.is_empty() {
        return OverlapMetrics {
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
            jaccard: 1.0,
        };
    }

    let intersection = predicted.intersection(actual).count() as f64;
    let union = predicted.union(actual).count() as f64;

    let precision = if predicted.is_empty() {
        0.0
    } else {
        intersection / predicted.len() as f64
    };
    let recall = if actual.is_empty() {
        0.0
    } else {
        intersection / actual.len() as f64
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    let jaccard = if union > 0.0 { intersection / union } else { 0.0 };

    OverlapMetrics {
        precision,
        recall,
        f1,
        jaccard,
    }
}

/// 母體標準差
fn mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count() as f64;
    let mean = values.clone().sum::<f64>() / n;
    let variance = values.map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

pub fn aggregate(all: &[OverlapMetrics]) -> Option<AggregateMetrics> {
    if all.is_empty() {
        return None;
    }

    let (precision_mean, precision_std) = mean_std(all.iter().map(|m| m.precision));
    let (recall_mean, recall_std) = mean_std(all.iter().map(|m| m.recall));
    let (f1_mean, f1_std) = mean_std(all.iter().map(|m| m.f1));
    let (jaccard_mean, jaccard_std) = mean_std(all.iter().map(|m| m.jaccard));

    Some(AggregateMetrics {
        precision_mean,
        precision_std,
        recall_mean,
        recall_std,
        f1_mean,
        f1_std,
        jaccard_mean,
        jaccard_std,
    })
}

/// Keywords the annotator ticked, without the "None of the above" option.
pub fn annotated_keywords(instance: &RawRecord) -> BTreeSet<String> {
    instance
        .get("label_annotations")
        .and_then(|v| v.get("valid_keywords"))
        .and_then(|v| v.as_object())
        .map(|labels| {
            labels
                .keys()
                .filter(|k| k.as_str() != NONE_OF_THE_ABOVE)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

pub fn instance_id(instance: &RawRecord) -> Option<String> {
    value_as_id(instance.get("instance_id")).or_else(|| value_as_id(instance.get("id")))
}

/// Scores one annotator. Instances without an id or with no counterpart in
/// `model_keywords` are skipped.
pub fn user_overlap(
    annotations: &[&RawRecord],
    model_keywords: &HashMap<String, BTreeSet<String>>,
) -> UserOverlap {
    let mut per_instance = Vec::new();

    for annotation in annotations {
        let Some(id) = instance_id(annotation) else {
            continue;
        };
        let Some(actual) = model_keywords.get(&id) else {
            tracing::debug!("Annotated instance {} not found in original data", id);
            continue;
        };

        let predicted = annotated_keywords(annotation);
        let metrics = compute_metrics(&predicted, actual);

        per_instance.push(InstanceOverlap {
            instance_id: id,
            model_keywords: actual.iter().cloned().collect(),
            annotated_keywords: predicted.into_iter().collect(),
            metrics,
        });
    }

    let all: Vec<OverlapMetrics> = per_instance.iter().map(|i| i.metrics).collect();

    UserOverlap {
        total_instances: per_instance.len(),
        aggregate_metrics: aggregate(&all),
        per_instance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_both_empty_is_perfect_agreement() {
        let m = compute_metrics(&set(&[]), &set(&[]));
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);
        assert_eq!(m.jaccard, 1.0);
    }

    #[test]
    fn test_disjoint_sets_score_zero() {
        let m = compute_metrics(&set(&["a"]), &set(&["b"]));
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.jaccard, 0.0);
    }

    #[test]
    fn test_empty_prediction_against_keywords() {
        let m = compute_metrics(&set(&[]), &set(&["a", "b"]));
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.jaccard, 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        let m = compute_metrics(&set(&["a", "b"]), &set(&["b", "c", "d"]));
        assert!(approx(m.precision, 0.5));
        assert!(approx(m.recall, 1.0 / 3.0));
        assert!(approx(m.f1, 0.4));
        assert!(approx(m.jaccard, 0.25));
    }

    #[test]
    fn test_aggregate_uses_population_std() {
        let a = compute_metrics(&set(&["a"]), &set(&["a"]));
        let b = compute_metrics(&set(&["a"]), &set(&["b"]));
        let agg = aggregate(&[a, b]).unwrap();
        assert!(approx(agg.precision_mean, 0.5));
        assert!(approx(agg.precision_std, 0.5));
        assert!(approx(agg.jaccard_mean, 0.5));
        assert!(aggregate(&[]).is_none());
    }

    #[test]
    fn test_annotated_keywords_drop_none_option() {
        let instance = json!({
            "id": "c1",
            "label_annotations": {"valid_keywords": {"brave": "true", "None of the above": "true"}}
        });
        let instance = instance.as_object().unwrap();
        assert_eq!(annotated_keywords(instance), set(&["brave"]));
    }

    #[test]
    fn test_user_overlap_skips_unknown_instances() {
        let known = json!({"instance_id": "c1", "label_annotations": {"valid_keywords": {"brave": "1"}}});
        let unknown = json!({"instance_id": "zz", "label_annotations": {}});
        let missing_id = json!({"label_annotations": {}});
        let annotations: Vec<&RawRecord> = vec![
            known.as_object().unwrap(),
            unknown.as_object().unwrap(),
            missing_id.as_object().unwrap(),
        ];
        let mut lookup = HashMap::new();
        lookup.insert("c1".to_string(), set(&["brave", "kind"]));

        let result = user_overlap(&annotations, &lookup);

        assert_eq!(result.total_instances, 1);
        assert_eq!(result.per_instance[0].model_keywords, vec!["brave", "kind"]);
        assert_eq!(result.per_instance[0].annotated_keywords, vec!["brave"]);
        assert!(approx(result.per_instance[0].metrics.recall, 0.5));
    }
}
