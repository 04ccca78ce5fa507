// src/normalize/normalizer.rs

// --- Imports ---
use super::diagnostics::Diagnostics;
use super::shape::{is_present, kind, Shape};
use serde_json::{Map, Value};

// --- Constants ---
pub const PARTS: &str = "parts";
pub const SECTIONS: &str = "sections";
pub const PART_NAME: &str = "part_name";
pub const SECTION_ID: &str = "section_id";
const DEFAULT_PART_NAME: &str = "Part";

/// A JSON object with its source field order preserved.
pub type Record = Map<String, Value>;

// --- Main Normalizer Structure ---

/// Rewrites filing documents into the canonical `parts`/`sections` array
/// shape, recording what it had to synthesize or drop along the way.
///
/// Every method is total: malformed shapes are absorbed by defaulting rules,
/// never reported as errors. Inputs are borrowed and never mutated.
#[derive(Debug, Default)]
pub struct Normalizer {
    diagnostics: Diagnostics,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Canonicalizes a `sections` field.
    pub fn sections(&mut self, raw: Option<&Value>) -> Vec<Record> {
        let sections = match Shape::of(raw) {
            Shape::Missing => Vec::new(),
            Shape::List(items) => self.sections_from_list(items),
            Shape::Map(map) => self.sections_from_map(map),
            Shape::Other(value) => {
                self.unrecognized(SECTIONS, value);
                Vec::new()
            }
        };
        self.diagnostics.sections += sections.len();
        sections
    }

    /// Canonicalizes a `parts` field, recursing into each part's sections.
    pub fn parts(&mut self, raw: Option<&Value>) -> Vec<Record> {
        let parts = match Shape::of(raw) {
            Shape::Missing => Vec::new(),
            Shape::List(items) => self.parts_from_list(items),
            Shape::Map(map) => self.parts_from_map(map),
            Shape::Other(value) => {
                self.unrecognized(PARTS, value);
                Vec::new()
            }
        };
        self.diagnostics.parts += parts.len();
        parts
    }

    /// Copies every top-level field except `parts`, then appends the
    /// canonical `parts` array.
    pub fn document(&mut self, doc: &Record) -> Record {
        let mut out: Record = doc
            .iter()
            .filter(|(key, _)| key.as_str() != PARTS)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let parts = self.parts(doc.get(PARTS));
        out.insert(PARTS.to_string(), records_to_value(parts));
        self.diagnostics.documents += 1;
        out
    }

    /// Normalizes either one document or an array of documents.
    ///
    /// Returns `None` when the top-level value is neither an object nor an
    /// array, since there is no document to emit.
    pub fn batch(&mut self, input: &Value) -> Option<Value> {
        match input {
            Value::Object(doc) => Some(Value::Object(self.document(doc))),
            Value::Array(docs) => {
                let mut out = Vec::with_capacity(docs.len());
                for (index, doc) in docs.iter().enumerate() {
                    match doc {
                        Value::Object(doc) => out.push(Value::Object(self.document(doc))),
                        other => {
                            self.diagnostics.dropped_documents += 1;
                            tracing::debug!("Dropping non-object document at index {} ({})", index, kind(other));
                        }
                    }
                }
                Some(Value::Array(out))
            }
            other => {
                tracing::debug!("Top-level {} is not a filing document", kind(other));
                None
            }
        }
    }

    // --- Section helpers ---

    fn sections_from_list(&mut self, items: &[Value]) -> Vec<Record> {
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Value::Object(section) = item else {
                self.diagnostics.dropped_sections += 1;
                tracing::debug!("Dropping non-object section at index {} ({})", index, kind(item));
                continue;
            };
            let mut section = section.clone();
            if !section.contains_key(SECTION_ID) {
                section.insert(SECTION_ID.to_string(), Value::String(format!("section_{}", index)));
                self.diagnostics.derived_section_ids += 1;
            }
            out.push(section);
        }
        out
    }

    fn sections_from_map(&mut self, map: &Map<String, Value>) -> Vec<Record> {
        map.iter()
            .map(|(key, value)| match value {
                // The mapping key is the id, even over an id the record carried.
                Value::Object(section) => {
                    let mut section = section.clone();
                    section.insert(SECTION_ID.to_string(), Value::String(key.clone()));
                    section
                }
                other => {
                    self.diagnostics.wrapped_values += 1;
                    let mut section = Record::new();
                    section.insert(SECTION_ID.to_string(), Value::String(key.clone()));
                    section.insert("value".to_string(), other.clone());
                    section
                }
            })
            .collect()
    }

    // --- Part helpers ---

    fn parts_from_list(&mut self, items: &[Value]) -> Vec<Record> {
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Value::Object(part) = item else {
                self.diagnostics.dropped_parts += 1;
                tracing::debug!("Dropping non-object part at index {} ({})", index, kind(item));
                continue;
            };
            let mut base = without_sections(part);
            // Name before sections so a second pass sees the same field order.
            if !is_present(base.get(PART_NAME)) {
                base.insert(PART_NAME.to_string(), Value::String(DEFAULT_PART_NAME.to_string()));
                self.diagnostics.defaulted_part_names += 1;
            }
            let sections = self.sections(part.get(SECTIONS));
            base.insert(SECTIONS.to_string(), records_to_value(sections));
            out.push(base);
        }
        out
    }

    fn parts_from_map(&mut self, map: &Map<String, Value>) -> Vec<Record> {
        let mut out = Vec::with_capacity(map.len());
        for (key, value) in map {
            let part = match value {
                Value::Object(part) => {
                    let part_name = match part.get(PART_NAME) {
                        Some(name) if is_present(Some(name)) => name.clone(),
                        _ => Value::String(key.clone()),
                    };
                    let mut base = without_sections(part);
                    base.insert(PART_NAME.to_string(), part_name);
                    let sections = self.sections(part.get(SECTIONS));
                    base.insert(SECTIONS.to_string(), records_to_value(sections));
                    base
                }
                other => {
                    self.diagnostics.wrapped_values += 1;
                    let mut base = Record::new();
                    base.insert(PART_NAME.to_string(), Value::String(key.clone()));
                    base.insert("value".to_string(), other.clone());
                    base.insert(SECTIONS.to_string(), Value::Array(Vec::new()));
                    base
                }
            };
            out.push(part);
        }
        out
    }

    fn unrecognized(&mut self, field: &str, value: &Value) {
        self.diagnostics.unrecognized_shapes += 1;
        tracing::debug!("Treating `{}` holding a {} as empty", field, kind(value));
    }
}

// --- Free-standing helpers ---

/// Clones a record minus its `sections` key, keeping field order.
fn without_sections(record: &Record) -> Record {
    record
        .iter()
        .filter(|(key, _)| key.as_str() != SECTIONS)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn records_to_value(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}

pub fn normalize_sections(raw: Option<&Value>) -> Vec<Record> {
    Normalizer::new().sections(raw)
}

pub fn normalize_parts(raw: Option<&Value>) -> Vec<Record> {
    Normalizer::new().parts(raw)
}

pub fn normalize_document(doc: &Record) -> Record {
    Normalizer::new().document(doc)
}

pub fn normalize_batch(input: &Value) -> Option<Value> {
    Normalizer::new().batch(input)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture is not an object: {}", other),
        }
    }

    fn keys(record: &Record) -> Vec<&str> {
        record.keys().map(String::as_str).collect()
    }

    #[test]
    fn list_sections_get_positional_ids() {
        let raw = json!([{"category": "business", "content": "..."}]);
        let sections = normalize_sections(Some(&raw));

        assert_eq!(
            Value::Array(sections.iter().cloned().map(Value::Object).collect()),
            json!([{"category": "business", "content": "...", "section_id": "section_0"}])
        );
        assert_eq!(keys(&sections[0]), ["category", "content", "section_id"]);
    }

    #[test]
    fn list_sections_keep_existing_ids_and_skip_noise() {
        let raw = json!(["stray text", {"section_id": "risk"}, 7, {"content": "x"}]);
        let mut normalizer = Normalizer::new();
        let sections = normalizer.sections(Some(&raw));

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0]["section_id"], "risk");
        // Index counts the dropped elements too.
        assert_eq!(sections[1]["section_id"], "section_3");
        assert_eq!(normalizer.diagnostics().dropped_sections, 2);
        assert_eq!(normalizer.diagnostics().derived_section_ids, 1);
    }

    #[test]
    fn mapping_sections_take_id_from_key() {
        let raw = json!({"business": {"content": "..."}});
        let sections = normalize_sections(Some(&raw));

        assert_eq!(Value::Object(sections[0].clone()), json!({"content": "...", "section_id": "business"}));
    }

    #[test]
    fn mapping_key_overrides_embedded_section_id() {
        let raw = json!({"risk_factors": {"section_id": "old", "content": "c"}});
        let sections = normalize_sections(Some(&raw));

        assert_eq!(sections[0]["section_id"], "risk_factors");
        assert_eq!(keys(&sections[0]), ["section_id", "content"]);
    }

    #[test]
    fn mapping_sections_wrap_scalar_values() {
        let raw = json!({"notes": "plain text", "count": 3});
        let sections = normalize_sections(Some(&raw));

        assert_eq!(Value::Object(sections[0].clone()), json!({"section_id": "notes", "value": "plain text"}));
        assert_eq!(Value::Object(sections[1].clone()), json!({"section_id": "count", "value": 3}));
    }

    #[test]
    fn mapping_iteration_follows_insertion_order() {
        let raw: Value = serde_json::from_str(r#"{"zeta": {}, "alpha": {}, "mid": {}}"#).unwrap();
        let ids: Vec<_> = normalize_sections(Some(&raw))
            .into_iter()
            .map(|s| s["section_id"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(ids, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn normalizers_are_total() {
        let inputs = [
            None,
            Some(json!(null)),
            Some(json!(42)),
            Some(json!("string")),
            Some(json!([])),
            Some(json!({})),
            Some(json!([1, 2, {"a": 1}])),
            Some(json!({"k": {"a": 1}, "j": 5})),
        ];
        for input in &inputs {
            let _ = normalize_sections(input.as_ref());
            let _ = normalize_parts(input.as_ref());
        }

        assert!(normalize_parts(Some(&json!(42))).is_empty());
        assert!(normalize_sections(Some(&json!("string"))).is_empty());
        assert_eq!(normalize_parts(Some(&json!([1, 2, {"a": 1}]))).len(), 1);
        assert_eq!(normalize_sections(Some(&json!({"k": {"a": 1}, "j": 5}))).len(), 2);
    }

    #[test]
    fn mapping_parts_wrap_scalar_values() {
        let parts = normalize_parts(Some(&json!({"Part_1": "raw text"})));

        assert_eq!(
            Value::Object(parts[0].clone()),
            json!({"part_name": "Part_1", "value": "raw text", "sections": []})
        );
        assert_eq!(keys(&parts[0]), ["part_name", "value", "sections"]);
    }

    #[test]
    fn mapping_parts_prefer_embedded_name() {
        let raw = json!({
            "Part_2": {"part_name": "Part II: Financial Information", "sections": []},
            "Part_3": {"part_name": "", "sections": []}
        });
        let parts = normalize_parts(Some(&raw));

        assert_eq!(parts[0]["part_name"], "Part II: Financial Information");
        assert_eq!(parts[1]["part_name"], "Part_3");
    }

    #[test]
    fn list_parts_default_missing_names() {
        let raw = json!([
            {"sections": [{"content": "a"}]},
            {"part_name": null},
            {"part_name": "Part III: Governance", "filed": "2023-02-01"}
        ]);
        let mut normalizer = Normalizer::new();
        let parts = normalizer.parts(Some(&raw));

        assert_eq!(parts[0]["part_name"], "Part");
        assert_eq!(keys(&parts[0]), ["part_name", "sections"]);
        assert_eq!(parts[0]["sections"], json!([{"content": "a", "section_id": "section_0"}]));
        assert_eq!(parts[1]["part_name"], "Part");
        assert_eq!(parts[1]["sections"], json!([]));
        assert_eq!(keys(&parts[2]), ["part_name", "filed", "sections"]);
        assert_eq!(normalizer.diagnostics().defaulted_part_names, 2);
    }

    #[test]
    fn document_passes_top_level_fields_through() {
        let doc = record(json!({"company": "Apple", "parts": {"Part_1": {}}, "year": 2023}));
        let out = normalize_document(&doc);

        assert_eq!(out["company"], "Apple");
        assert_eq!(out["year"], 2023);
        assert_eq!(keys(&out), ["company", "year", "parts"]);
    }

    #[test]
    fn document_without_parts_gets_empty_array() {
        let out = normalize_document(&record(json!({"company": "Apple"})));
        assert_eq!(out["parts"], json!([]));
    }

    #[test]
    fn document_leaves_input_untouched() {
        let doc = record(json!({"parts": {"Part_1": {"sections": {"a": {}}}}}));
        let before = doc.clone();
        let _ = normalize_document(&doc);

        assert_eq!(serde_json::to_string(&doc).unwrap(), serde_json::to_string(&before).unwrap());
    }

    #[test]
    fn acme_filing_end_to_end() {
        let doc = record(json!({
            "company_name": "Acme",
            "parts": {"Part_1": {"sections": {"business": {"content": "We make widgets."}}}}
        }));
        let out = normalize_document(&doc);

        let expected = r#"{"company_name":"Acme","parts":[{"part_name":"Part_1","sections":[{"content":"We make widgets.","section_id":"business"}]}]}"#;
        assert_eq!(serde_json::to_string(&out).unwrap(), expected);
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let docs = [
            json!({"company_name": "Acme", "parts": {"Part_1": {"sections": {"business": {"content": "w"}}}}}),
            json!({"parts": [{"sections": [{"content": "a"}, 3]}, "noise", {"part_name": ""}]}),
            json!({"parts": {"Part_1": "raw", "Part_2": {"part_name": "Part II", "sections": ["x", {"k": 1}]}}}),
            json!({"parts": 17, "ticker": "ACME"}),
        ];
        for doc in docs {
            let once = normalize_document(&record(doc));
            let twice = normalize_document(&once);
            assert_eq!(serde_json::to_string(&twice).unwrap(), serde_json::to_string(&once).unwrap());
        }
    }

    #[test]
    fn batch_of_many_keeps_order_and_drops_scalars() {
        let input = json!([
            {"company_name": "A", "parts": {}},
            "not a document",
            {"company_name": "B"}
        ]);
        let mut normalizer = Normalizer::new();
        let out = normalizer.batch(&input).unwrap();

        let docs = out.as_array().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["company_name"], "A");
        assert_eq!(docs[1]["company_name"], "B");
        assert_eq!(normalizer.diagnostics().documents, 2);
        assert_eq!(normalizer.diagnostics().dropped_documents, 1);
    }

    #[test]
    fn batch_of_one_stays_an_object() {
        let out = normalize_batch(&json!({"company_name": "A"})).unwrap();
        assert!(out.is_object());
        assert_eq!(out["parts"], json!([]));
    }

    #[test]
    fn batch_rejects_scalar_top_level() {
        assert!(normalize_batch(&json!("just text")).is_none());
    }

    #[test]
    fn diagnostics_count_emitted_records() {
        let doc = record(json!({"parts": {"Part_1": {"sections": {"a": {}, "b": "text"}}, "Part_2": 5}}));
        let mut normalizer = Normalizer::new();
        normalizer.document(&doc);
        let diag = normalizer.into_diagnostics();

        assert_eq!(diag.documents, 1);
        assert_eq!(diag.parts, 2);
        assert_eq!(diag.sections, 2);
        assert_eq!(diag.wrapped_values, 2);
    }
}
