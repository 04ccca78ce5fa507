// src/batch.rs
//! Runs a per-document operation over many files. Each file is loaded,
//! transformed and written on the blocking pool; a failure is reported for
//! that file only and the rest of the run continues.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::classify::AnnotateStats;
use crate::merge::CompanyMerge;
use crate::normalize::{Diagnostics, Normalizer};
use crate::rewrite::RelabelStats;
use crate::storage::{list_json_files, load_input, write_json, StorageManager};
use crate::utils::error::StorageError;
use crate::utils::AppError;

/// One input file and where its result goes (the same path for in-place
/// rewrites).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// What an operation did to one file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Normalized(Diagnostics),
    Relabelled(RelabelStats),
    Stripped { removed: usize },
    Promoted { changed: usize },
    Annotated(AnnotateStats),
    Merged { years: Vec<String>, skipped_files: usize },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Normalized(d) => write!(
                f,
                "{} document(s), {} part(s), {} section(s), {} dropped",
                d.documents, d.parts, d.sections, d.dropped()
            ),
            Outcome::Relabelled(s) => write!(f, "{} part name(s) updated, {} unresolved", s.updated, s.unresolved),
            Outcome::Stripped { removed } => write!(f, "{} field(s) removed", removed),
            Outcome::Promoted { changed } => write!(f, "{} categor(ies) replaced", changed),
            Outcome::Annotated(s) => write!(
                f,
                "{} section(s) annotated, {} empty, {} default fallback(s)",
                s.annotated, s.skipped_empty, s.fallbacks
            ),
            Outcome::Merged { years, skipped_files } => {
                write!(f, "{} year(s) merged, {} file(s) skipped", years.len(), skipped_files)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Succeeded { outcome: Outcome },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, FileStatus::Succeeded { .. })
    }
}

/// Per-document operation run by the batch driver. It may replace the value
/// wholesale.
pub type Operation = dyn Fn(&mut Value) -> Result<Outcome, AppError> + Send + Sync;

// --- Job planning ---

/// `input` may be a file or a directory of `*.json` files; results land in
/// `output` (a file path for a file input, a directory otherwise).
pub fn plan_jobs(input: &Path, output: &Path) -> Result<Vec<FileJob>, StorageError> {
    if input.is_dir() {
        let storage = StorageManager::new(output)?;
        let jobs = list_json_files(input, None)?
            .into_iter()
            .map(|file| FileJob { output: storage.output_path_for(&file), input: file })
            .collect();
        return Ok(jobs);
    }
    Ok(vec![FileJob { input: input.to_path_buf(), output: output.to_path_buf() }])
}

/// Every `*.json` file in `dir`, rewritten where it lies.
pub fn plan_in_place(dir: &Path) -> Result<Vec<FileJob>, StorageError> {
    Ok(list_json_files(dir, None)?
        .into_iter()
        .map(|file| FileJob { output: file.clone(), input: file })
        .collect())
}

// --- Operations ---

/// Replaces the file's content with its canonical form.
pub fn normalize_op(value: &mut Value) -> Result<Outcome, AppError> {
    let mut normalizer = Normalizer::new();
    let normalized = normalizer
        .batch(value)
        .ok_or_else(|| AppError::Processing("top-level JSON is neither an object nor an array".to_string()))?;
    *value = normalized;
    Ok(Outcome::Normalized(normalizer.into_diagnostics()))
}

/// One report entry per company: the company directory is the input, the
/// merged file the output. Companies with nothing readable count as failed.
pub fn merge_reports(companies: Vec<CompanyMerge>) -> Vec<FileReport> {
    companies
        .into_iter()
        .map(|company| {
            let CompanyMerge { company_dir, years, skipped_files, output, .. } = company;
            let status = match output {
                Some(_) => FileStatus::Succeeded { outcome: Outcome::Merged { years, skipped_files } },
                None => FileStatus::Failed {
                    reason: format!("no readable yearly data ({} file(s) skipped)", skipped_files),
                },
            };
            FileReport { input: company_dir, output: output.unwrap_or_default(), status }
        })
        .collect()
}

// --- Execution ---

fn process_file(job: &FileJob, op: &Operation) -> Result<Outcome, AppError> {
    let mut value = load_input(&job.input)?;
    let outcome = op(&mut value)?;
    write_json(&job.output, &value)?;
    Ok(outcome)
}

/// Applies `op` to every job with at most `concurrency` files in flight.
/// Reports come back in job order.
pub async fn run_files<F>(jobs: Vec<FileJob>, concurrency: usize, op: F) -> Vec<FileReport>
where
    F: Fn(&mut Value) -> Result<Outcome, AppError> + Send + Sync + 'static,
{
    let total = jobs.len();
    let op = Arc::new(op);
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut set = JoinSet::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let op = Arc::clone(&op);
        let semaphore = Arc::clone(&semaphore);
        set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let (input, output) = (job.input.clone(), job.output.clone());

            let result = tokio::task::spawn_blocking(move || process_file(&job, op.as_ref()))
                .await
                .unwrap_or_else(|e| Err(AppError::Processing(format!("worker task failed: {}", e))));

            let status = match result {
                Ok(outcome) => {
                    tracing::info!("Processed {}: {}", input.display(), outcome);
                    FileStatus::Succeeded { outcome }
                }
                Err(e) => {
                    tracing::error!("Failed to process {}: {}", input.display(), e);
                    FileStatus::Failed { reason: e.to_string() }
                }
            };
            (index, FileReport { input, output, status })
        });
    }

    let mut reports = Vec::with_capacity(total);
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => tracing::error!("Batch task did not complete: {}", e),
        }
    }
    reports.sort_by_key(|(index, _)| *index);
    reports.into_iter().map(|(_, report)| report).collect()
}

// --- Run summary ---

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub command: String,
    pub started_at: String,
    pub finished_at: String,
    pub succeeded: usize,
    pub failed: usize,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn new(command: &str, started_at: DateTime<Utc>, files: Vec<FileReport>) -> Self {
        let succeeded = files.iter().filter(|r| r.succeeded()).count();
        Self {
            command: command.to_string(),
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            succeeded,
            failed: files.len() - succeeded,
            files,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let value = serde_json::to_value(self).map_err(|e| StorageError::Serialization(e.to_string()))?;
        write_json(path, &value)
    }
}
