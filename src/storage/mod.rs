// src/storage/mod.rs
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::utils::error::StorageError;

/// Number of leading non-blank lines probed when sniffing for NDJSON.
const NDJSON_PROBE_LINES: usize = 10;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|e| StorageError::io(&base_path, e))?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Output location for an input file: same file name, under the base dir.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        match input.file_name() {
            Some(name) => self.base_dir.join(name),
            None => self.base_dir.join("output.json"),
        }
    }

    /// Saves a document under the base directory
    pub fn save_document(&self, file_name: &str, value: &Value) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(file_name);
        write_json(&file_path, value)?;
        Ok(file_path)
    }
}

/// Heuristic NDJSON detection: more than one non-blank line, and each of the
/// first few non-blank lines parses as JSON on its own.
pub fn is_probably_ndjson(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() <= 1 {
        return false;
    }
    lines
        .iter()
        .take(NDJSON_PROBE_LINES)
        .all(|line| serde_json::from_str::<Value>(line).is_ok())
}

/// Position of a syntax error within the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Parses either a single JSON document or NDJSON. NDJSON becomes an array
/// of the per-line values; error lines refer to the original text.
pub fn parse_input(text: &str) -> Result<Value, ParseFailure> {
    if is_probably_ndjson(text) {
        let mut docs = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let indent = line.len() - line.trim_start().len();
            let doc: Value = serde_json::from_str(trimmed).map_err(|e| ParseFailure {
                line: index + 1,
                column: e.column() + indent,
                message: error_message(&e),
            })?;
            docs.push(doc);
        }
        return Ok(Value::Array(docs));
    }

    serde_json::from_str(text).map_err(|e| ParseFailure {
        line: e.line(),
        column: e.column(),
        message: error_message(&e),
    })
}

/// serde_json's message without its trailing " at line X column Y"; the
/// position is kept separately.
fn error_message(e: &serde_json::Error) -> String {
    let text = e.to_string();
    let position = format!(" at line {} column {}", e.line(), e.column());
    match text.strip_suffix(&position) {
        Some(message) => message.to_string(),
        None => text,
    }
}

/// Reads and parses one input file.
pub fn load_input(path: &Path) -> Result<Value, StorageError> {
    let text = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    parse_input(&text).map_err(|failure| StorageError::Json {
        path: path.to_path_buf(),
        line: failure.line,
        column: failure.column,
        message: failure.message,
    })
}

/// Pretty-prints `value` to `path` (2-space indent, non-ASCII unescaped),
/// creating parent directories as needed.
pub fn write_json(path: &Path, value: &Value) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
    }

    let mut text = serde_json::to_string_pretty(value)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    text.push('\n');

    fs::write(path, text).map_err(|e| StorageError::io(path, e))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

/// Lists `*.json` files directly inside `dir`, sorted by name. Files whose
/// name starts with `skip_prefix` are left out.
pub fn list_json_files(dir: &Path, skip_prefix: Option<&str>) -> Result<Vec<PathBuf>, StorageError> {
    let entries = fs::read_dir(dir).map_err(|e| StorageError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StorageError::io(dir, e))?.path();
        if !path.is_file() || path.extension() != Some(OsStr::new("json")) {
            continue;
        }
        let skipped = match (skip_prefix, path.file_name().and_then(OsStr::to_str)) {
            (Some(prefix), Some(name)) => name.starts_with(prefix),
            _ => false,
        };
        if !skipped {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_line_is_not_ndjson() {
        assert!(!is_probably_ndjson(r#"{"a": 1}"#));
        assert!(!is_probably_ndjson("\n\n  {\"a\": 1}  \n"));
    }

    #[test]
    fn pretty_json_is_not_ndjson() {
        let text = "{\n  \"company_name\": \"Acme\",\n  \"parts\": {}\n}\n";
        assert!(!is_probably_ndjson(text));
        assert_eq!(parse_input(text).unwrap()["company_name"], "Acme");
    }

    #[test]
    fn object_lines_are_ndjson() {
        let text = "{\"company_name\": \"A\"}\n\n{\"company_name\": \"B\"}\n";
        assert!(is_probably_ndjson(text));
        assert_eq!(
            parse_input(text).unwrap(),
            json!([{"company_name": "A"}, {"company_name": "B"}])
        );
    }

    #[test]
    fn ndjson_error_reports_file_line() {
        let mut lines: Vec<String> = (0..12).map(|i| format!("{{\"n\": {}}}", i)).collect();
        lines.push("{\"n\": oops}".to_string());
        let failure = parse_input(&lines.join("\n")).unwrap_err();

        assert_eq!(failure.line, 13);
    }

    #[test]
    fn document_error_reports_position() {
        let failure = parse_input("{\n  \"a\": 1,\n  \"b\" 2\n}").unwrap_err();
        assert_eq!(failure.line, 3);
        assert_eq!(failure.message, "expected `:`");
    }

    #[test]
    fn ndjson_error_column_counts_leading_whitespace() {
        let good: Vec<String> = (0..10).map(|i| format!("{{\"n\": {}}}", i)).collect();
        let plain = parse_input(&format!("{}\n{{\"n\": oops}}", good.join("\n"))).unwrap_err();
        let indented = parse_input(&format!("{}\n   {{\"n\": oops}}", good.join("\n"))).unwrap_err();

        assert_eq!(indented.line, 11);
        assert_eq!(indented.column, plain.column + 3);
        assert!(!indented.message.contains("at line"));
    }

    #[test]
    fn load_error_states_position_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trailing.json");
        fs::write(&path, "{\"a\": 1}\n}}}").unwrap();

        let text = load_input(&path).unwrap_err().to_string();
        assert!(text.contains("at line 2,"), "{}", text);
        assert!(text.ends_with(": trailing characters"), "{}", text);
    }

    #[test]
    fn write_then_load_keeps_unicode_unescaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        write_json(&path, &json!({"company_name": "Société Générale"})).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Société Générale"));
        assert!(text.contains("\n  \"company_name\""));
        assert_eq!(load_input(&path).unwrap()["company_name"], "Société Générale");
    }

    #[test]
    fn load_input_names_missing_file() {
        let err = load_input(Path::new("/nonexistent/filing.json")).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/filing.json"));
    }

    #[test]
    fn lists_sorted_json_files_with_skip_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.json", "example_template.json", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        let files = list_json_files(dir.path(), Some("example")).unwrap();
        let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();

        assert_eq!(names, ["a.json", "b.json"]);
    }

    #[test]
    fn storage_manager_maps_output_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("out")).unwrap();

        assert!(storage.base_dir().exists());
        assert_eq!(
            storage.output_path_for(Path::new("/in/AAPL_10k.json")),
            dir.path().join("out").join("AAPL_10k.json")
        );
    }
}
