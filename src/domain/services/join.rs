use crate::domain::model::{CharacterEntry, JoinedCharacters, RawRecord};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};

/// 字串或數字的欄位值轉成 id；空字串視為不存在
pub fn value_as_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn bio_id(bio: &RawRecord) -> Option<String> {
    value_as_id(bio.get("character_json")).or_else(|| value_as_id(bio.get("id")))
}

pub fn bio_name(bio: &RawRecord) -> String {
    match bio.get("character_name") {
        Some(Value::String(s)) if !s.is_empty() => return s.clone(),
        _ => {}
    }
    match bio.get("name") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "Unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

pub fn bio_biography(bio: &RawRecord) -> String {
    match bio.get("biography") {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// `personality_keywords.English`，非字串元素略過
pub fn english_keywords(model_output: &RawRecord) -> Vec<String> {
    model_output
        .get("personality_keywords")
        .and_then(|v| v.get("English"))
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Joins biographies with model outputs on the character id.
///
/// Bios without an id, ids listed in `exclude`, ids with no model output and
/// characters whose model produced no English keywords are skipped. The
/// keyword pool is the sorted union of the kept characters' keywords.
pub fn join_characters(
    bios: &[RawRecord],
    model_outputs: &[RawRecord],
    exclude: &HashSet<String>,
) -> JoinedCharacters {
    let mut lookup: HashMap<String, &RawRecord> = HashMap::new();
    for output in model_outputs {
        match value_as_id(output.get("character_json")) {
            Some(id) => {
                lookup.insert(id, output);
            }
            None => tracing::debug!("Skipping model output without character_json"),
        }
    }

    let mut entries = Vec::new();
    let mut pool = BTreeSet::new();

    for bio in bios {
        let Some(id) = bio_id(bio) else {
            continue;
        };
        if exclude.contains(&id) {
            continue;
        }
        let Some(model_output) = lookup.get(&id) else {
            continue;
        };

        let keywords = english_keywords(model_output);
        if keywords.is_empty() {
            continue;
        }

        pool.extend(keywords.iter().cloned());
        entries.push(CharacterEntry {
            id,
            name: bio_name(bio),
            biography: bio_biography(bio),
            model_keywords: keywords,
        });
    }

    JoinedCharacters {
        entries,
        keyword_pool: pool.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_bio_id_falls_back_to_id_field() {
        assert_eq!(
            bio_id(&record(json!({"character_json": "a.json", "id": "x"}))),
            Some("a.json".to_string())
        );
        assert_eq!(
            bio_id(&record(json!({"character_json": "", "id": "x"}))),
            Some("x".to_string())
        );
        assert_eq!(bio_id(&record(json!({"id": 42}))), Some("42".to_string()));
        assert_eq!(bio_id(&record(json!({"name": "nobody"}))), None);
    }

    #[test]
    fn test_bio_name_fallbacks() {
        assert_eq!(
            bio_name(&record(json!({"character_name": "Lumine", "name": "L"}))),
            "Lumine"
        );
        assert_eq!(bio_name(&record(json!({"name": "Paimon"}))), "Paimon");
        assert_eq!(bio_name(&record(json!({}))), "Unknown");
    }

    #[test]
    fn test_join_skips_unmatched_and_keywordless() {
        let bios = vec![
            record(json!({"character_json": "a", "character_name": "A", "biography": "bio a"})),
            record(json!({"character_json": "b", "character_name": "B"})),
            record(json!({"character_json": "c", "character_name": "C"})),
            record(json!({"biography": "no id"})),
        ];
        let outputs = vec![
            record(json!({"character_json": "a", "personality_keywords": {"English": ["brave", "kind"]}})),
            record(json!({"character_json": "b", "personality_keywords": {"English": []}})),
        ];

        let joined = join_characters(&bios, &outputs, &HashSet::new());

        assert_eq!(joined.entries.len(), 1);
        assert_eq!(joined.entries[0].id, "a");
        assert_eq!(joined.entries[0].biography, "bio a");
        assert_eq!(joined.keyword_pool, vec!["brave", "kind"]);
    }

    #[test]
    fn test_join_respects_exclusions() {
        let bios = vec![
            record(json!({"id": "a", "name": "A"})),
            record(json!({"id": "b", "name": "B"})),
        ];
        let outputs = vec![
            record(json!({"character_json": "a", "personality_keywords": {"English": ["shy"]}})),
            record(json!({"character_json": "b", "personality_keywords": {"English": ["bold"]}})),
        ];
        let exclude: HashSet<String> = ["a".to_string()].into_iter().collect();

        let joined = join_characters(&bios, &outputs, &exclude);

        assert_eq!(joined.entries.len(), 1);
        assert_eq!(joined.entries[0].id, "b");
        assert_eq!(joined.keyword_pool, vec!["bold"]);
    }
}
