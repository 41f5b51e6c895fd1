use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::blast::{BlastClient, BlastRequest};
use crate::centroids::CentroidStore;
use crate::config::ResolvedConfig;
use crate::domain::BlastProgram;
use crate::error::CmapError;
use crate::join::join_hits;
use crate::partition::partition_joined;
use crate::plot::{PlotExecutor, build_jobs};
use crate::workspace::Workspace;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub query: PathBuf,
    pub blast_db: PathBuf,
    pub program: BlastProgram,
    pub config: ResolvedConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub hits_file: String,
    pub joined_file: String,
    pub unique_centroids: usize,
    pub unmatched_centroids: usize,
    pub joined_rows: usize,
    pub partitions: Vec<PartitionSummary>,
    pub jobs_run: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub file: String,
    pub qseqid: String,
    pub pident: f64,
}

pub struct App<B: BlastClient, C: CentroidStore, P: PlotExecutor> {
    workspace: Workspace,
    blast: B,
    centroids: C,
    plotter: P,
}

impl<B: BlastClient, C: CentroidStore, P: PlotExecutor> App<B, C, P> {
    pub fn new(workspace: Workspace, blast: B, centroids: C, plotter: P) -> Self {
        Self {
            workspace,
            blast,
            centroids,
            plotter,
        }
    }

    pub fn run(&self, options: &PipelineOptions) -> Result<PipelineReport, CmapError> {
        self.validate(options)?;
        self.workspace.ensure_out_root()?;

        info!("running BLAST");
        let hits_file = self.blast.run(&BlastRequest {
            program: options.program,
            query: options.query.clone(),
            blast_db: options.blast_db.clone(),
            out_file: self.workspace.hits_path().into_std_path_buf(),
            perc_identity: options.config.perc_identity,
            qcov_hsp_perc: options.config.qcov_hsp_perc,
        })?;

        info!("centroids query");
        self.workspace.ensure_data_dir()?;
        let joined_path = self.workspace.joined_path();
        let summary = join_hits(&hits_file, &self.centroids, joined_path.as_std_path())?;

        let partitions = partition_joined(joined_path.as_std_path(), &self.workspace)?;

        let plot_program = &options.config.plot_program;
        if !plot_program.is_file() {
            return Err(CmapError::PlotProgramMissing(plot_program.clone()));
        }
        let jobs = build_jobs(&partitions, &self.workspace, plot_program);
        self.plotter.run(&jobs, options.config.num_cpus)?;

        Ok(PipelineReport {
            hits_file: hits_file.display().to_string(),
            joined_file: joined_path.to_string(),
            unique_centroids: summary.unique_centroids,
            unmatched_centroids: summary.unmatched_centroids,
            joined_rows: summary.rows_written,
            partitions: partitions
                .iter()
                .map(|partition| PartitionSummary {
                    file: partition.path.to_string(),
                    qseqid: partition.qseqid.clone(),
                    pident: partition.pident,
                })
                .collect(),
            jobs_run: jobs.len(),
        })
    }

    fn validate(&self, options: &PipelineOptions) -> Result<(), CmapError> {
        if !options.query.is_file() {
            return Err(CmapError::QueryNotFound(options.query.clone()));
        }
        validate_blast_db(&options.blast_db)?;
        Ok(())
    }
}

/// A BLAST database is a basename prefix: the directory must exist and hold
/// at least one index file starting with that prefix.
pub fn validate_blast_db(blast_db: &Path) -> Result<(), CmapError> {
    let absolute = if blast_db.is_absolute() {
        blast_db.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|err| CmapError::Filesystem(err.to_string()))?
            .join(blast_db)
    };
    let dir = absolute
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| CmapError::BlastDbDirMissing(absolute.clone()))?;
    if !dir.is_dir() {
        return Err(CmapError::BlastDbDirMissing(dir));
    }

    let name = absolute
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or_default()
        .to_string();
    let entries = fs::read_dir(&dir).map_err(|err| CmapError::Filesystem(err.to_string()))?;
    let found = entries.flatten().any(|entry| {
        entry
            .file_name()
            .to_str()
            .map(|file| file.starts_with(&name))
            .unwrap_or(false)
    });
    if !found {
        return Err(CmapError::BlastDbFilesMissing { name, dir });
    }
    Ok(())
}
