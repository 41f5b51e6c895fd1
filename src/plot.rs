use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::info;

use crate::blast::find_in_path;
use crate::error::CmapError;
use crate::partition::PartitionFile;
use crate::workspace::Workspace;

/// One plot invocation, rendered as a shell command line in the job file.
#[derive(Debug, Clone)]
pub struct PlotJob {
    pub command: String,
}

pub fn build_jobs(
    partitions: &[PartitionFile],
    workspace: &Workspace,
    plot_program: &Path,
) -> Vec<PlotJob> {
    partitions
        .iter()
        .map(|partition| {
            let out_dir = workspace.plot_dir(&partition.path);
            let title = format!(
                "eASV* Abundance For Cruise \"{}\" ({} \u{3bc}M size frac.)",
                partition.key.cruise_name, partition.key.size_label
            );
            let legend = format!(
                "*eASV ID=\"{}\" is {}% similar to query \"{}\"",
                partition.key.centroid, partition.pident, partition.qseqid
            );
            PlotJob {
                command: format!(
                    "{} -f {} -o {} -t '{}' -l '{}'",
                    plot_program.display(),
                    partition.path,
                    out_dir,
                    title,
                    legend
                ),
            }
        })
        .collect()
}

pub trait PlotExecutor {
    fn run(&self, jobs: &[PlotJob], num_procs: usize) -> Result<(), CmapError>;
}

/// Runs the job file through GNU parallel when it is on PATH, one shell
/// invocation per line otherwise. The job file is a temp file, removed on
/// every exit path.
#[derive(Clone, Default)]
pub struct SystemPlotRunner;

impl SystemPlotRunner {
    pub fn new() -> Self {
        Self
    }

    fn write_job_file(jobs: &[PlotJob]) -> Result<NamedTempFile, CmapError> {
        let mut job_file =
            NamedTempFile::new().map_err(|err| CmapError::Filesystem(err.to_string()))?;
        for job in jobs {
            writeln!(job_file, "{}", job.command)
                .map_err(|err| CmapError::Filesystem(err.to_string()))?;
        }
        job_file
            .flush()
            .map_err(|err| CmapError::Filesystem(err.to_string()))?;
        Ok(job_file)
    }

    fn run_parallel(
        parallel: &Path,
        job_file: &Path,
        num_procs: usize,
    ) -> Result<(), CmapError> {
        let command = format!(
            "{} --halt soon,fail=1 -P {} < {}",
            parallel.display(),
            num_procs,
            job_file.display()
        );
        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .output()
            .map_err(|err| CmapError::Filesystem(format!("spawn sh: {err}")))?;
        if !output.status.success() {
            return Err(CmapError::ParallelFailed {
                status: output.status.code().unwrap_or(-1),
                output: merged_output(&output.stdout, &output.stderr),
            });
        }
        Ok(())
    }

    fn run_sequential(jobs: &[PlotJob]) -> Result<(), CmapError> {
        for job in jobs {
            let output = Command::new("sh")
                .arg("-c")
                .arg(&job.command)
                .output()
                .map_err(|err| CmapError::Filesystem(format!("spawn sh: {err}")))?;
            if !output.status.success() {
                return Err(CmapError::PlotFailed {
                    status: output.status.code().unwrap_or(-1),
                    output: merged_output(&output.stdout, &output.stderr),
                });
            }
        }
        Ok(())
    }
}

impl PlotExecutor for SystemPlotRunner {
    fn run(&self, jobs: &[PlotJob], num_procs: usize) -> Result<(), CmapError> {
        if jobs.is_empty() {
            return Ok(());
        }

        // Dropping the handle removes the file on every exit path.
        let job_file = Self::write_job_file(jobs)?;

        info!(
            jobs = jobs.len(),
            cpus = num_procs,
            "plotting"
        );

        match find_in_path("parallel") {
            Some(parallel) => Self::run_parallel(&parallel, job_file.path(), num_procs),
            None => Self::run_sequential(jobs),
        }
    }
}

fn merged_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(stderr).trim().to_string();
    match (stdout.is_empty(), stderr.is_empty()) {
        (false, false) => format!("{stdout}\n{stderr}"),
        (false, true) => stdout,
        (true, _) => stderr,
    }
}
