// src/config.rs
use crate::utils::AppError;

/// Environment variable consulted when `--jobs` is not given.
pub const JOBS_ENV: &str = "FILING_NORMALIZER_JOBS";

/// Resolves how many files are processed at once: the CLI flag, else
/// `FILING_NORMALIZER_JOBS`, else the machine's available parallelism.
pub fn resolve_jobs(cli: Option<usize>) -> Result<usize, AppError> {
    let env = std::env::var(JOBS_ENV).ok();
    jobs_from(cli, env.as_deref())
}

fn jobs_from(cli: Option<usize>, env: Option<&str>) -> Result<usize, AppError> {
    let jobs = match (cli, env) {
        (Some(jobs), _) => jobs,
        (None, Some(raw)) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| AppError::Config(format!("{} must be a positive integer, got '{}'", JOBS_ENV, raw)))?,
        (None, None) => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
    };

    if jobs == 0 {
        return Err(AppError::Config("job count must be at least 1".to_string()));
    }
    tracing::debug!("Using {} concurrent file job(s)", jobs);
    Ok(jobs)
}
