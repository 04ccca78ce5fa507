// src/rewrite/category.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

// --- Regex Patterns (Lazy Static) ---
// Leading item number such as "1. ", "1A. ", "7A ". Must start with a digit so
// a bare title like "Business" keeps its first letter.
static LEADING_ITEM_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9][0-9A-Z]*\.?\s*").expect("Failed to compile LEADING_ITEM_NUMBER_RE")
});

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9\s]").expect("Failed to compile NON_WORD_RE")
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE")
});

// Checked in order; the first phrase contained in the title wins.
const CATEGORY_PHRASES: &[(&str, &str)] = &[
    ("business", "business"),
    ("risk factors", "risk_factors"),
    ("unresolved staff comments", "unresolved_staff_comments"),
    ("properties", "properties"),
    ("legal proceedings", "legal_proceedings"),
    ("mine safety disclosures", "mine_safety_disclosures"),
    ("market for registrant", "market_info"),
    ("market for registrants common equity", "market_info"),
    ("selected financial data", "selected_financial_data"),
    ("management discussion", "management_discussion"),
    ("quantitative and qualitative disclosures", "market_risk_disclosures"),
    ("financial statements", "financial_statements"),
    ("changes in and disagreements", "auditor_changes"),
    ("controls and procedures", "controls_procedures"),
    ("other information", "other_information"),
    ("directors trustees", "directors_officers"),
    ("executive compensation", "executive_compensation"),
    ("security ownership", "security_ownership"),
    ("certain relationships", "related_party_transactions"),
    ("principal accounting", "accounting_fees"),
    ("exhibits", "exhibits"),
    ("form 10 k summary", "form_summary"),
];

const UNKNOWN_CATEGORY: &str = "unknown_section";

/// Turns an extractor output file name into a short category slug, e.g.
/// `Section_1_Item_1._Business.txt` -> `business`.
pub fn simplify_category_name(file_name: &str) -> String {
    let name = file_name.replace(".txt", "");

    let title = if name.contains("_Item_") {
        let pieces: Vec<&str> = name.split('_').collect();
        pieces
            .iter()
            .enumerate()
            .find(|(i, piece)| piece.contains("Item") && i + 1 < pieces.len())
            .map(|(i, _)| pieces[i + 1..].join("_"))
            .unwrap_or_else(|| pieces.last().copied().unwrap_or_default().to_string())
    } else {
        name.rsplit('_').next().unwrap_or_default().to_string()
    };

    let spaced = title.replace('_', " ");
    let without_number = LEADING_ITEM_NUMBER_RE.replace(&spaced, "");
    let lower = without_number.trim_matches(|c: char| c == '.' || c == '_').to_lowercase();

    if let Some((_, category)) = CATEGORY_PHRASES.iter().find(|(phrase, _)| lower.contains(phrase)) {
        return category.to_string();
    }

    let cleaned = NON_WORD_RE.replace_all(&lower, "");
    let slug = WHITESPACE_RE.replace_all(cleaned.trim(), "_");
    if slug.is_empty() {
        UNKNOWN_CATEGORY.to_string()
    } else {
        slug.into_owned()
    }
}

/// Renames every `file_name` key to `category`, simplifying string values
/// with [`simplify_category_name`]. Field position is kept. Returns the
/// number of keys renamed.
pub fn categorize_file_names(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => {
            let mut renamed = 0;
            let fields = std::mem::take(map);
            let mut out = Map::with_capacity(fields.len());
            for (key, mut child) in fields {
                if key == "file_name" {
                    let category = match child.as_str() {
                        Some(file_name) => Value::String(simplify_category_name(file_name)),
                        None => child,
                    };
                    out.insert("category".to_string(), category);
                    renamed += 1;
                } else {
                    renamed += categorize_file_names(&mut child);
                    out.insert(key, child);
                }
            }
            *map = out;
            renamed
        }
        Value::Array(items) => items.iter_mut().map(categorize_file_names).sum(),
        _ => 0,
    }
}
