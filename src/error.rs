use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CmapError {
    #[error("invalid BLAST program: {0}")]
    InvalidProgram(String),

    #[error("invalid centroid id: {0}")]
    InvalidCentroidId(String),

    #[error("query file not found: {0}")]
    QueryNotFound(PathBuf),

    #[error("--blast-db dir {0} is not a dir")]
    BlastDbDirMissing(PathBuf),

    #[error("no BLAST \"{name}\" files in {dir}")]
    BlastDbFilesMissing { name: String, dir: PathBuf },

    #[error("--centroids-db {0} is not a file")]
    CentroidsDbMissing(PathBuf),

    #[error("plot program not found: {0}")]
    PlotProgramMissing(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("failed to run BLAST ({status}):\n{output}")]
    BlastFailed { status: i32, output: String },

    #[error("no hits from BLAST")]
    NoHits,

    #[error("malformed hit on line {line}: {message}")]
    HitParse { line: u64, message: String },

    #[error("centroids query failed: {0}")]
    Sqlite(String),

    #[error("CMAP request failed: {0}")]
    CmapHttp(String),

    #[error("CMAP returned status {status}: {message}")]
    CmapStatus { status: u16, message: String },

    #[error("CMAP_API_KEY is not set")]
    MissingApiKey,

    #[error("plot job failed ({status}):\n{output}")]
    PlotFailed { status: i32, output: String },

    #[error("parallel runner failed ({status}):\n{output}")]
    ParallelFailed { status: i32, output: String },

    #[error("csv error: {0}")]
    Csv(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl From<csv::Error> for CmapError {
    fn from(err: csv::Error) -> Self {
        CmapError::Csv(err.to_string())
    }
}

impl From<rusqlite::Error> for CmapError {
    fn from(err: rusqlite::Error) -> Self {
        CmapError::Sqlite(err.to_string())
    }
}
