// src/rewrite/fields.rs
use serde_json::Value;

/// Fields dropped by default when publishing classified filings.
pub const DEFAULT_STRIP_FIELDS: [&str; 3] = ["gemini_item_name", "gemini_part_name", "section_id"];

/// Removes every key named in `fields` from every object in `value`.
/// Returns how many keys were removed.
pub fn strip_fields<S: AsRef<str>>(value: &mut Value, fields: &[S]) -> usize {
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|key, _| !fields.iter().any(|f| f.as_ref() == key.as_str()));
            let removed = before - map.len();
            if removed > 0 {
                tracing::trace!("Removed {} field(s)", removed);
            }
            removed + map.values_mut().map(|child| strip_fields(child, fields)).sum::<usize>()
        }
        Value::Array(items) => items.iter_mut().map(|item| strip_fields(item, fields)).sum(),
        _ => 0,
    }
}

/// Wherever an object carries both `category` and `gemini_item_name`, the
/// classifier's item name replaces the category. Returns the number of
/// categories that changed.
pub fn promote_item_name(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => {
            let mut changed = 0;
            if let (Some(_), Some(item)) = (map.get("category"), map.get("gemini_item_name")) {
                let item = item.clone();
                if map.get("category") != Some(&item) {
                    tracing::debug!("Replacing category {} with {}", map["category"], item);
                    map.insert("category".to_string(), item);
                    changed += 1;
                }
            }
            changed + map.values_mut().map(promote_item_name).sum::<usize>()
        }
        Value::Array(items) => items.iter_mut().map(promote_item_name).sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_named_fields_at_every_depth() {
        let mut doc = json!({
            "company_name": "Acme",
            "section_id": "top",
            "parts": [{"part_name": "Part I", "sections": [
                {"section_id": "business", "gemini_part_name": "Part I", "gemini_item_name": "Item 1. Business", "content": "c"}
            ]}]
        });
        let removed = strip_fields(&mut doc, &DEFAULT_STRIP_FIELDS);

        assert_eq!(removed, 4);
        assert_eq!(
            doc,
            json!({"company_name": "Acme", "parts": [{"part_name": "Part I", "sections": [{"content": "c"}]}]})
        );
    }

    #[test]
    fn strip_keeps_remaining_field_order() {
        let mut doc = json!({"a": 1, "gemini_confidence": "low", "b": 2, "c": 3});
        strip_fields(&mut doc, &["gemini_confidence"]);
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"a":1,"b":2,"c":3}"#);
    }

    #[test]
    fn promotes_item_name_only_where_both_exist() {
        let mut doc = json!({"sections": [
            {"category": "business", "gemini_item_name": "Item 1. Business"},
            {"category": "risk_factors"},
            {"gemini_item_name": "Item 2. Properties"},
            {"category": "Item 3. Legal Proceedings", "gemini_item_name": "Item 3. Legal Proceedings"}
        ]});
        let changed = promote_item_name(&mut doc);

        assert_eq!(changed, 1);
        assert_eq!(doc["sections"][0]["category"], "Item 1. Business");
        assert_eq!(doc["sections"][1]["category"], "risk_factors");
        assert!(doc["sections"][2].get("category").is_none());
    }
}
