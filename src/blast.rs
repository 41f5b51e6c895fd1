use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::domain::BlastProgram;
use crate::error::CmapError;

#[derive(Debug, Clone)]
pub struct BlastRequest {
    pub program: BlastProgram,
    pub query: PathBuf,
    pub blast_db: PathBuf,
    pub out_file: PathBuf,
    pub perc_identity: f64,
    pub qcov_hsp_perc: f64,
}

pub trait BlastClient {
    /// Runs the search and returns the hits-file path. Zero output lines is
    /// an error; there is nothing downstream to do without hits.
    fn run(&self, request: &BlastRequest) -> Result<PathBuf, CmapError>;
}

#[derive(Clone, Default)]
pub struct SystemBlastClient;

impl SystemBlastClient {
    pub fn new() -> Self {
        Self
    }

    fn resolve_program(&self, program: BlastProgram) -> Result<PathBuf, CmapError> {
        find_in_path(&program.to_string())
            .ok_or_else(|| CmapError::MissingTool(program.to_string()))
    }

    fn build_args(request: &BlastRequest) -> Vec<String> {
        let mut args = vec![
            "-query".to_string(),
            request.query.to_string_lossy().to_string(),
            "-db".to_string(),
            request.blast_db.to_string_lossy().to_string(),
            "-out".to_string(),
            request.out_file.to_string_lossy().to_string(),
            "-outfmt".to_string(),
            "6".to_string(),
        ];
        if request.perc_identity > 0.0 {
            args.push("-perc_identity".to_string());
            args.push(request.perc_identity.to_string());
        }
        if request.qcov_hsp_perc > 0.0 {
            args.push("-qcov_hsp_perc".to_string());
            args.push(request.qcov_hsp_perc.to_string());
        }
        args
    }
}

impl BlastClient for SystemBlastClient {
    fn run(&self, request: &BlastRequest) -> Result<PathBuf, CmapError> {
        let program = self.resolve_program(request.program)?;
        let args = Self::build_args(request);

        let output = Command::new(&program)
            .args(&args)
            .output()
            .map_err(|err| CmapError::Filesystem(format!("spawn {}: {err}", program.display())))?;

        if !output.status.success() {
            return Err(CmapError::BlastFailed {
                status: output.status.code().unwrap_or(-1),
                output: captured_output(&output.stdout, &output.stderr),
            });
        }

        if line_count(&request.out_file)? == 0 {
            return Err(CmapError::NoHits);
        }

        Ok(request.out_file.clone())
    }
}

fn captured_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(stderr).trim().to_string();
    match (stdout.is_empty(), stderr.is_empty()) {
        (false, false) => format!("{stdout}\n{stderr}"),
        (false, true) => stdout,
        (true, _) => stderr,
    }
}

fn line_count(path: &Path) -> Result<usize, CmapError> {
    let content = fs::read_to_string(path)
        .map_err(|err| CmapError::Filesystem(format!("read {}: {err}", path.display())))?;
    Ok(content.lines().count())
}

pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}
