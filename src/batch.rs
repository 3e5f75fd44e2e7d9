//! Rewriting of independent documents, in parallel when enabled.
//!
//! Each job opens its own engine, so jobs share nothing but the
//! read-only lexicon.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::Result;
use crate::model::TransformStats;
use crate::options::RewriteOptions;

/// Prefix of output files named after their input.
pub const OUTPUT_PREFIX: &str = "transformed_";

/// One input document and where its rewrite goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl BatchJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Write next to the input as `transformed_<name>`.
    pub fn beside(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = default_output_path(&input);
        Self { input, output }
    }

    /// Write into `dir` as `transformed_<name>`.
    pub fn into_dir(input: impl Into<PathBuf>, dir: &Path) -> Self {
        let input = input.into();
        let output = dir.join(output_file_name(&input));
        Self { input, output }
    }
}

/// Outcome of one job.
#[derive(Debug)]
pub struct BatchResult {
    pub job: BatchJob,
    pub outcome: Result<TransformStats>,
}

impl BatchResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// `transformed_<name>` next to `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_file_name(output_file_name(input))
}

fn output_file_name(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output.pdf".to_string());
    format!("{}{}", OUTPUT_PREFIX, name)
}

/// Run every job. Results come back in job order.
pub fn transform_files(jobs: &[BatchJob], options: &RewriteOptions) -> Vec<BatchResult> {
    transform_files_with_progress(jobs, options, |_| {})
}

/// Like [`transform_files`], calling `on_done` as each job finishes.
pub fn transform_files_with_progress<F>(
    jobs: &[BatchJob],
    options: &RewriteOptions,
    on_done: F,
) -> Vec<BatchResult>
where
    F: Fn(&BatchResult) + Sync,
{
    let run = |job: &BatchJob| {
        let result = BatchResult {
            job: job.clone(),
            outcome: crate::transform_file_with_options(&job.input, &job.output, options),
        };
        if let Err(e) = &result.outcome {
            log::warn!("{}: {}", job.input.display(), e);
        }
        on_done(&result);
        result
    };

    if options.parallel {
        jobs.par_iter().map(run).collect()
    } else {
        jobs.iter().map(run).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let output = default_output_path(Path::new("/tmp/docs/letter.pdf"));
        assert_eq!(output, PathBuf::from("/tmp/docs/transformed_letter.pdf"));
    }

    #[test]
    fn test_job_constructors() {
        let job = BatchJob::beside("a/b.pdf");
        assert_eq!(job.output, PathBuf::from("a/transformed_b.pdf"));

        let job = BatchJob::into_dir("a/b.pdf", Path::new("out"));
        assert_eq!(job.output, PathBuf::from("out/transformed_b.pdf"));
    }

    #[test]
    fn test_missing_inputs_fail_per_job() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = vec![
            BatchJob::into_dir(dir.path().join("missing-1.pdf"), dir.path()),
            BatchJob::into_dir(dir.path().join("missing-2.pdf"), dir.path()),
        ];
        let results = transform_files(&jobs, &RewriteOptions::default());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.is_ok()));
        assert_eq!(results[1].job, jobs[1]);
    }
}
