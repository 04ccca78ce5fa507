// src/merge/mod.rs
//! Folds per-year extractor output into one JSON file per company:
//! `<companies>/<COMPANY>/python_output_10k/<YEAR>/*.json` becomes
//! `<out>/<COMPANY>_10k.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::normalize::Normalizer;
use crate::rewrite::categorize_file_names;
use crate::storage::{list_json_files, load_input, StorageManager};
use crate::utils::error::StorageError;

/// Directory under each company holding the yearly extraction output.
pub const YEARLY_OUTPUT_DIR: &str = "python_output_10k";

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Also bring each year's content into the canonical parts/sections shape.
    pub normalize: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyMerge {
    pub company_name: String,
    pub company_dir: PathBuf,
    pub years: Vec<String>,
    pub skipped_files: usize,
    /// Where the merged file was written; `None` when no year was readable.
    pub output: Option<PathBuf>,
}

impl CompanyMerge {
    pub fn is_merged(&self) -> bool {
        self.output.is_some()
    }
}

/// Result of merging one company directory. `document` is `None` when the
/// yearly output held no readable file.
#[derive(Debug, Clone)]
pub struct MergedCompany {
    pub document: Option<Value>,
    pub summary: CompanyMerge,
}

/// Builds the merged document for one company directory. Returns `None`
/// when the company has no yearly output directory at all.
pub fn merge_company(company_dir: &Path, options: MergeOptions) -> Result<Option<MergedCompany>, StorageError> {
    let company_name = company_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let yearly_dir = company_dir.join(YEARLY_OUTPUT_DIR);
    if !yearly_dir.is_dir() {
        tracing::info!("No {} directory found for {}", YEARLY_OUTPUT_DIR, company_name);
        return Ok(None);
    }

    let mut summary = CompanyMerge {
        company_name: company_name.clone(),
        company_dir: company_dir.to_path_buf(),
        years: Vec::new(),
        skipped_files: 0,
        output: None,
    };
    let mut years_data = Map::new();

    for year_dir in sorted_subdirs(&yearly_dir)? {
        let year = year_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let files = list_json_files(&year_dir, None)?;
        if files.is_empty() {
            tracing::info!("No JSON files found for {} year {}", company_name, year);
            continue;
        }

        // Normally one file per year; when there are several the last wins.
        for file in files {
            let mut content = match load_input(&file) {
                Ok(content) => content,
                Err(e) => {
                    tracing::error!("Skipping {}: {}", file.display(), e);
                    summary.skipped_files += 1;
                    continue;
                }
            };
            categorize_file_names(&mut content);
            if options.normalize {
                if let Some(normalized) = Normalizer::new().batch(&content) {
                    content = normalized;
                }
            }
            years_data.insert(year.clone(), json!({ "year": year, "content": content }));
            tracing::debug!("Merged {} into {} {}", file.display(), company_name, year);
        }
    }

    if years_data.is_empty() {
        tracing::warn!("No valid data found for {}", company_name);
        return Ok(Some(MergedCompany { document: None, summary }));
    }

    summary.years = years_data.keys().cloned().collect();
    let merged = json!({ "company_name": company_name, "years_data": Value::Object(years_data) });
    Ok(Some(MergedCompany { document: Some(merged), summary }))
}

/// Merges every company directory under `companies_dir` and writes one
/// `<company>_10k.json` per company into `output_dir`. Companies with yearly
/// output but nothing readable are returned unmerged (`output: None`).
pub fn merge_companies(companies_dir: &Path, output_dir: &Path, options: MergeOptions) -> Result<Vec<CompanyMerge>, StorageError> {
    let storage = StorageManager::new(output_dir)?;
    let mut merged = Vec::new();

    for company_dir in sorted_subdirs(companies_dir)? {
        let Some(MergedCompany { document, mut summary }) = merge_company(&company_dir, options)? else {
            continue;
        };
        if let Some(document) = document {
            let file_name = format!("{}_10k.json", summary.company_name);
            let path = storage.save_document(&file_name, &document)?;
            tracing::info!("Saved merged data for {} ({} years) to {}", summary.company_name, summary.years.len(), path.display());
            summary.output = Some(path);
        }
        merged.push(summary);
    }

    Ok(merged)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let entries = fs::read_dir(dir).map_err(|e| StorageError::io(dir, e))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StorageError::io(dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn merges_years_and_categorizes_sections() {
        let root = tempfile::tempdir().unwrap();
        let acme = root.path().join("ACME").join(YEARLY_OUTPUT_DIR);
        write(
            &acme.join("2022").join("acme.json"),
            r#"{"parts": {"Part_1": {"sections": {"s1": {"file_name": "Section_1_Item_1._Business.txt", "content": "Widgets"}}}}}"#,
        );
        write(&acme.join("2023").join("acme.json"), r#"{"parts": []}"#);
        write(&acme.join("2024").join("broken.json"), "{ nope");
        fs::create_dir_all(root.path().join("EMPTY")).unwrap();
        write(&root.path().join("BAD").join(YEARLY_OUTPUT_DIR).join("2023").join("bad.json"), "[1,");

        let out = root.path().join("merged");
        let report = merge_companies(root.path(), &out, MergeOptions { normalize: true }).unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].company_name, "ACME");
        assert_eq!(report[0].years, ["2022", "2023"]);
        assert_eq!(report[0].skipped_files, 1);
        assert!(report[0].is_merged());

        assert_eq!(report[1].company_name, "BAD");
        assert_eq!(report[1].skipped_files, 1);
        assert!(!report[1].is_merged());
        assert!(!out.join("BAD_10k.json").exists());

        let merged = load_input(&out.join("ACME_10k.json")).unwrap();
        assert_eq!(merged["company_name"], "ACME");
        assert_eq!(merged["years_data"]["2022"]["year"], "2022");
        let section = &merged["years_data"]["2022"]["content"]["parts"][0]["sections"][0];
        assert_eq!(section["category"], "business");
        assert_eq!(section["section_id"], "s1");
    }

    #[test]
    fn company_without_yearly_output_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("NOPE")).unwrap();
        assert!(merge_company(&root.path().join("NOPE"), MergeOptions::default()).unwrap().is_none());
    }
}
