// src/rewrite/part_names.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::classify::VALID_PARTS;
use crate::normalize::is_present;

const GEMINI_PART_NAME: &str = "gemini_part_name";

// `Part_1_...`, `Part_II`, `Part_IV_Exhibits`. Roman alternatives are listed
// longest first so `Part_II` never reads as `Part_I`.
static PART_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Part_([0-9]+|IV|III|II|I)(?:_|\b)").expect("Failed to compile PART_MARKER_RE")
});

/// How a part's label is chosen when no section carries a classifier label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelabelMode {
    /// Only copy `gemini_part_name` from the part's sections.
    FromSections,
    /// Leave canonical labels alone, and fall back to the `Part_<n>` marker in
    /// the current name when the sections carry no label.
    Inferred,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelabelStats {
    pub updated: usize,
    pub unresolved: usize,
}

/// Rewrites `part_name` on every part of every `parts` array in `value`.
pub fn relabel_parts(value: &mut Value, mode: RelabelMode) -> RelabelStats {
    let mut stats = RelabelStats::default();
    relabel_value(value, mode, &mut stats);
    stats
}

fn relabel_value(value: &mut Value, mode: RelabelMode, stats: &mut RelabelStats) {
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                relabel_value(child, mode, stats);
            }
            if let Some(Value::Array(parts)) = map.get_mut("parts") {
                for part in parts.iter_mut() {
                    if let Value::Object(part) = part {
                        relabel_part(part, mode, stats);
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                relabel_value(item, mode, stats);
            }
        }
        _ => {}
    }
}

fn relabel_part(part: &mut Map<String, Value>, mode: RelabelMode, stats: &mut RelabelStats) {
    let Some(current) = part.get("part_name") else {
        return;
    };
    let current_name = current.as_str().unwrap_or_default().to_string();

    if mode == RelabelMode::Inferred && is_canonical_part_label(&current_name) {
        return;
    }

    let label = section_part_label(part).or_else(|| match mode {
        RelabelMode::Inferred => infer_part_label(&current_name).map(|l| Value::String(l.to_string())),
        RelabelMode::FromSections => None,
    });

    match label {
        Some(label) => {
            if part.get("part_name") != Some(&label) {
                tracing::info!("Updating part_name from '{}' to {}", current_name, label);
                part.insert("part_name".to_string(), label);
                stats.updated += 1;
            }
        }
        None if mode == RelabelMode::Inferred => {
            tracing::warn!("Could not determine part name for: '{}'", current_name);
            stats.unresolved += 1;
        }
        None => {}
    }
}

/// Label from the first section that has a `gemini_part_name` key, if that
/// value is usable.
fn section_part_label(part: &Map<String, Value>) -> Option<Value> {
    let sections = part.get("sections")?.as_array()?;
    let label = sections
        .iter()
        .filter_map(Value::as_object)
        .find_map(|section| section.get(GEMINI_PART_NAME))?;
    is_present(Some(label)).then(|| label.clone())
}

pub fn is_canonical_part_label(name: &str) -> bool {
    ["Part I:", "Part II:", "Part III:", "Part IV:"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Maps a `Part_<n>` / `Part_<roman>` marker in a raw part key to its
/// canonical 10-K part label.
pub fn infer_part_label(name: &str) -> Option<&'static str> {
    let marker = PART_MARKER_RE.captures(name)?.get(1)?.as_str();
    let index = match marker {
        "1" | "I" => 0,
        "2" | "II" => 1,
        "3" | "III" => 2,
        "4" | "5" | "IV" => 3,
        _ => return None,
    };
    Some(VALID_PARTS[index])
}
