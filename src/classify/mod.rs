// src/classify/mod.rs
//! Section classification: the injected classifier capability, the offline
//! category-based default, and the pass that writes `gemini_*` labels onto
//! canonical sections.

// --- Imports ---
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::error::ClassifyError;

// --- Canonical 10-K Labels ---
pub const VALID_PARTS: [&str; 4] = [
    "Part I: Business and Risk Factors",
    "Part II: Financial Information",
    "Part III: Governance",
    "Part IV: Exhibits and Schedules",
];

pub const VALID_ITEMS: [&str; 22] = [
    "Item 1. Business",
    "Item 1A. Risk Factors",
    "Item 1B. Unresolved Staff Comments",
    "Item 2. Properties",
    "Item 3. Legal Proceedings",
    "Item 4. Mine Safety Disclosures",
    "Item 5. Market for Registrant's Common Equity, Related Stockholder Matters and Issuer Purchases of Equity Securities",
    "Item 6. [Reserved]",
    "Item 7. Management's Discussion and Analysis of Financial Condition and Results of Operations (MD&A)",
    "Item 7A. Quantitative and Qualitative Disclosures About Market Risk",
    "Item 8. Financial Statements and Supplementary Data",
    "Item 9. Changes in and Disagreements With Accountants on Accounting and Financial Disclosure",
    "Item 9A. Controls and Procedures",
    "Item 9B. Other Information",
    "Item 9C. Disclosure Regarding Foreign Jurisdictions that Prevent Inspections",
    "Item 10. Directors, Executive Officers and Corporate Governance",
    "Item 11. Executive Compensation",
    "Item 12. Security Ownership of Certain Beneficial Owners and Management and Related Stockholder Matters",
    "Item 13. Certain Relationships and Related Transactions, and Director Independence",
    "Item 14. Principal Accountant Fees and Services",
    "Item 15. Exhibits, Financial Statement Schedules",
    "Item 16. Form 10-K Summary",
];

// category -> (part index, item index)
const DEFAULT_TABLE: &[(&str, usize, usize)] = &[
    ("business", 0, 0),
    ("risk_factors", 0, 1),
    ("properties", 0, 3),
    ("legal_proceedings", 0, 4),
    ("selected_financial_data", 1, 7),
    ("management_discussion", 1, 8),
    ("financial_statements", 1, 10),
    ("controls_procedures", 1, 12),
    ("directors_officers", 2, 15),
    ("executive_compensation", 2, 16),
    ("exhibits", 3, 20),
];

// --- Data Structures ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub part_name: String,
    pub item_name: String,
    pub confidence: Confidence,
}

impl Classification {
    /// True when both labels are drawn from the canonical 10-K lists.
    pub fn is_canonical(&self) -> bool {
        VALID_PARTS.contains(&self.part_name.as_str()) && VALID_ITEMS.contains(&self.item_name.as_str())
    }
}

/// Something that can label a section of filing text with its 10-K part and
/// item. Network-backed implementations live outside this crate.
pub trait SectionClassifier {
    fn classify(&self, section_text: &str, current_category: &str) -> Result<Classification, ClassifyError>;
}

/// Low-confidence classification derived from the extractor's category alone.
pub fn default_classification(current_category: &str) -> Classification {
    let (part, item) = DEFAULT_TABLE
        .iter()
        .find(|(category, _, _)| *category == current_category)
        .map(|(_, part, item)| (*part, *item))
        .unwrap_or((0, 0));

    Classification {
        part_name: VALID_PARTS[part].to_string(),
        item_name: VALID_ITEMS[item].to_string(),
        confidence: Confidence::Low,
    }
}

/// Offline classifier that answers from the category table only.
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryClassifier;

impl SectionClassifier for CategoryClassifier {
    fn classify(&self, _section_text: &str, current_category: &str) -> Result<Classification, ClassifyError> {
        Ok(default_classification(current_category))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnnotateStats {
    pub annotated: usize,
    pub skipped_empty: usize,
    pub fallbacks: usize,
}

/// Writes `gemini_part_name`, `gemini_item_name` and `gemini_confidence`
/// onto every section with non-blank `content`, wherever a `parts` array
/// appears in `value`.
pub fn annotate_sections(value: &mut Value, classifier: &dyn SectionClassifier) -> AnnotateStats {
    let mut stats = AnnotateStats::default();
    annotate_value(value, classifier, &mut stats);
    stats
}

fn annotate_value(value: &mut Value, classifier: &dyn SectionClassifier, stats: &mut AnnotateStats) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(parts)) = map.get_mut("parts") {
                for part in parts.iter_mut().filter_map(Value::as_object_mut) {
                    if let Some(Value::Array(sections)) = part.get_mut("sections") {
                        for section in sections.iter_mut().filter_map(Value::as_object_mut) {
                            annotate_section(section, classifier, stats);
                        }
                    }
                }
            }
            for (key, child) in map.iter_mut() {
                if key != "parts" {
                    annotate_value(child, classifier, stats);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                annotate_value(item, classifier, stats);
            }
        }
        _ => {}
    }
}

fn annotate_section(section: &mut Map<String, Value>, classifier: &dyn SectionClassifier, stats: &mut AnnotateStats) {
    let category = section.get("category").and_then(Value::as_str).unwrap_or("unknown").to_string();
    let content = section.get("content").and_then(Value::as_str).unwrap_or_default();
    if content.trim().is_empty() {
        stats.skipped_empty += 1;
        return;
    }

    let result = match classifier.classify(content, &category) {
        Ok(result) if result.is_canonical() => result,
        Ok(result) => {
            tracing::warn!("Non-canonical classification for '{}': {:?}; using default", category, result);
            stats.fallbacks += 1;
            default_classification(&category)
        }
        Err(e) => {
            tracing::warn!("Classification failed for '{}': {}; using default", category, e);
            stats.fallbacks += 1;
            default_classification(&category)
        }
    };

    tracing::debug!("{} -> {} | {} | {:?}", category, result.part_name, result.item_name, result.confidence);
    section.insert("gemini_part_name".to_string(), Value::String(result.part_name));
    section.insert("gemini_item_name".to_string(), Value::String(result.item_name));
    let confidence = serde_json::to_value(result.confidence).unwrap_or(Value::Null);
    section.insert("gemini_confidence".to_string(), confidence);
    stats.annotated += 1;
}
