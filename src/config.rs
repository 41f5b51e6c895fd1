use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CmapError;

pub const DEFAULT_PERC_IDENTITY: f64 = 97.0;
pub const DEFAULT_QCOV_HSP_PERC: f64 = 100.0;
pub const DEFAULT_NUM_CPUS: usize = 8;
pub const DEFAULT_PLOT_PROGRAM: &str = "plot.r";

/// Optional `blast2cmap.json` supplying pipeline defaults. CLI flags win
/// over the file; the file wins over built-in defaults.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub perc_identity: Option<f64>,
    #[serde(default)]
    pub qcov_hsp_perc: Option<f64>,
    #[serde(default)]
    pub num_cpus: Option<usize>,
    #[serde(default)]
    pub plot_program: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub perc_identity: f64,
    pub qcov_hsp_perc: f64,
    pub num_cpus: usize,
    pub plot_program: PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<Config, CmapError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("blast2cmap.json"),
        };

        // The default file is optional; an explicit --config path is not.
        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CmapError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| CmapError::ConfigParse(err.to_string()))
    }

    pub fn merge(
        config: Config,
        perc_identity: Option<f64>,
        qcov_hsp_perc: Option<f64>,
        num_cpus: Option<usize>,
        plot_program: Option<String>,
    ) -> ResolvedConfig {
        ResolvedConfig {
            perc_identity: perc_identity
                .or(config.perc_identity)
                .unwrap_or(DEFAULT_PERC_IDENTITY),
            qcov_hsp_perc: qcov_hsp_perc
                .or(config.qcov_hsp_perc)
                .unwrap_or(DEFAULT_QCOV_HSP_PERC),
            num_cpus: num_cpus.or(config.num_cpus).unwrap_or(DEFAULT_NUM_CPUS),
            plot_program: PathBuf::from(
                plot_program
                    .or(config.plot_program)
                    .unwrap_or_else(|| DEFAULT_PLOT_PROGRAM.to_string()),
            ),
        }
    }
}
