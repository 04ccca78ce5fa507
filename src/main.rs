// src/main.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use filing_normalizer::batch::{self, FileJob, FileReport, Outcome, RunReport};
use filing_normalizer::classify::{annotate_sections, CategoryClassifier};
use filing_normalizer::merge::{merge_companies, MergeOptions};
use filing_normalizer::rewrite::{promote_item_name, relabel_parts, strip_fields, RelabelMode, DEFAULT_STRIP_FIELDS};
use filing_normalizer::storage::{list_json_files, StorageManager};
use filing_normalizer::utils::{self, AppError};
use filing_normalizer::config;

/// Command Line Interface for normalizing 10-K filing JSON
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log at debug level (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of files processed concurrently (default: FILING_NORMALIZER_JOBS or CPU count)
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// Write a JSON run summary to this path
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert filings to the canonical parts/sections array shape
    Normalize {
        /// Input JSON/NDJSON file, or a directory of *.json files
        input: PathBuf,
        /// Output file, or output directory when INPUT is a directory
        output: PathBuf,
    },
    /// Merge per-year extractor output into one file per company
    Merge {
        /// Directory holding one sub-directory per company
        companies_dir: PathBuf,
        /// Where <COMPANY>_10k.json files are written
        output_dir: PathBuf,
        /// Normalize each year's content while merging
        #[arg(long)]
        normalize: bool,
    },
    /// Replace part names with the classifier's part labels (in place)
    RelabelParts {
        dir: PathBuf,
        /// Infer labels from Part_<n> markers when no section has one
        #[arg(long)]
        infer: bool,
    },
    /// Remove fields from every object (in place)
    StripFields {
        dir: PathBuf,
        /// Field to remove; repeatable. Defaults to gemini_item_name, gemini_part_name, section_id
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },
    /// Replace `category` with `gemini_item_name` where both exist (in place)
    PromoteItem { dir: PathBuf },
    /// Label sections using the offline category classifier
    Annotate {
        input_dir: PathBuf,
        output_dir: PathBuf,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Normalize { .. } => "normalize",
            Command::Merge { .. } => "merge",
            Command::RelabelParts { .. } => "relabel-parts",
            Command::StripFields { .. } => "strip-fields",
            Command::PromoteItem { .. } => "promote-item",
            Command::Annotate { .. } => "annotate",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.verbose);
    tracing::info!("Starting processing for args: {:?}", args);
    let started_at = chrono::Utc::now();
    let jobs = config::resolve_jobs(args.jobs)?;
    let command_name = args.command.name();

    // 3. Run the selected command
    let reports = match args.command {
        Command::Normalize { input, output } => {
            let files = batch::plan_jobs(&input, &output)?;
            run(files, jobs, batch::normalize_op).await?
        }
        Command::Merge { companies_dir, output_dir, normalize } => {
            let merged = merge_companies(&companies_dir, &output_dir, MergeOptions { normalize })?;
            if merged.is_empty() {
                return Err(AppError::Processing(format!("No company data found under {}", companies_dir.display())));
            }
            let written = merged.iter().filter(|c| c.is_merged()).count();
            tracing::info!("Merged {} of {} compan(ies) into {}", written, merged.len(), output_dir.display());
            batch::merge_reports(merged)
        }
        Command::RelabelParts { dir, infer } => {
            let mode = if infer { RelabelMode::Inferred } else { RelabelMode::FromSections };
            run(batch::plan_in_place(&dir)?, jobs, move |value: &mut Value| {
                Ok(Outcome::Relabelled(relabel_parts(value, mode)))
            })
            .await?
        }
        Command::StripFields { dir, fields } => {
            let fields = if fields.is_empty() {
                DEFAULT_STRIP_FIELDS.iter().map(|f| f.to_string()).collect()
            } else {
                fields
            };
            tracing::info!("Removing fields: {:?}", fields);
            run(batch::plan_in_place(&dir)?, jobs, move |value: &mut Value| {
                Ok(Outcome::Stripped { removed: strip_fields(value, &fields) })
            })
            .await?
        }
        Command::PromoteItem { dir } => {
            run(batch::plan_in_place(&dir)?, jobs, |value: &mut Value| {
                Ok(Outcome::Promoted { changed: promote_item_name(value) })
            })
            .await?
        }
        Command::Annotate { input_dir, output_dir } => {
            let storage = StorageManager::new(&output_dir)?;
            // Skip template files such as example_company.json
            let files = list_json_files(&input_dir, Some("example"))?
                .into_iter()
                .map(|input| FileJob { output: storage.output_path_for(&input), input })
                .collect();
            run(files, jobs, |value: &mut Value| {
                Ok(Outcome::Annotated(annotate_sections(value, &CategoryClassifier)))
            })
            .await?
        }
    };

    // 4. Summarize
    let report = RunReport::new(command_name, started_at, reports);
    tracing::info!("Processing finished. Success: {}, Failures: {}", report.succeeded, report.failed);

    if let Some(path) = &args.report {
        match report.save(path) {
            Ok(()) => tracing::info!("Saved run report to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save run report: {}", e),
        }
    }

    if report.succeeded == 0 && report.failed > 0 {
        return Err(AppError::Processing(format!("Failed to process any of {} file(s)", report.failed)));
    }

    Ok(())
}

async fn run<F>(files: Vec<FileJob>, jobs: usize, op: F) -> Result<Vec<FileReport>, AppError>
where
    F: Fn(&mut Value) -> Result<Outcome, AppError> + Send + Sync + 'static,
{
    if files.is_empty() {
        return Err(AppError::Config("No JSON files found to process".to_string()));
    }
    tracing::info!("Processing {} file(s) with {} job(s)", files.len(), jobs);
    Ok(batch::run_files(files, jobs, op).await)
}
