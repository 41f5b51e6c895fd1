use std::fs;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::GroupKey;
use crate::error::CmapError;

/// Owns the layout of the output directory: the raw hits file, the joined
/// CSV under `data/`, one partition CSV per group, and one plot directory
/// per partition.
#[derive(Debug, Clone)]
pub struct Workspace {
    out_root: Utf8PathBuf,
}

impl Workspace {
    pub fn new(out_dir: &Path) -> Result<Self, CmapError> {
        let out_root = Utf8PathBuf::from_path_buf(out_dir.to_path_buf())
            .map_err(|_| CmapError::Filesystem("output dir is not valid UTF-8".to_string()))?;
        Ok(Self { out_root })
    }

    pub fn out_root(&self) -> &Utf8Path {
        &self.out_root
    }

    pub fn hits_path(&self) -> Utf8PathBuf {
        self.out_root.join("hits.tab")
    }

    pub fn data_dir(&self) -> Utf8PathBuf {
        self.out_root.join("data")
    }

    pub fn joined_path(&self) -> Utf8PathBuf {
        self.data_dir().join("oce-input.csv")
    }

    /// Partition file name, e.g.
    /// `asv_c1__cruise_TN397__qseqid_q1__pident_98.57__frac_0.2-3.csv`.
    pub fn partition_path(&self, key: &GroupKey, qseqid: &str, pident: f64) -> Utf8PathBuf {
        self.data_dir().join(format!(
            "asv_{}__cruise_{}__qseqid_{}__pident_{:.2}__frac_{}.csv",
            key.centroid, key.cruise_name, qseqid, pident, key.size_label
        ))
    }

    /// Per-partition plot output directory, named after the partition file
    /// stem.
    pub fn plot_dir(&self, partition: &Utf8Path) -> Utf8PathBuf {
        let stem = partition.file_stem().unwrap_or("plot");
        self.out_root.join(stem)
    }

    pub fn ensure_out_root(&self) -> Result<(), CmapError> {
        fs::create_dir_all(self.out_root.as_std_path())
            .map_err(|err| CmapError::Filesystem(err.to_string()))
    }

    pub fn ensure_data_dir(&self) -> Result<(), CmapError> {
        fs::create_dir_all(self.data_dir().as_std_path())
            .map_err(|err| CmapError::Filesystem(err.to_string()))
    }
}
