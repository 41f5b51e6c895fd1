use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::debug;

use crate::domain::{GroupKey, size_label};
use crate::error::CmapError;
use crate::join::JoinedRow;
use crate::workspace::Workspace;

/// A written partition file together with the key it holds rows for.
#[derive(Debug, Clone)]
pub struct PartitionFile {
    pub path: Utf8PathBuf,
    pub key: GroupKey,
    pub qseqid: String,
    pub pident: f64,
}

/// Splits the joined CSV into one file per distinct (centroid, cruise,
/// size-fraction) combination, in first-seen order. Only non-empty groups
/// produce files.
pub fn partition_joined(
    joined_path: &Path,
    workspace: &Workspace,
) -> Result<Vec<PartitionFile>, CmapError> {
    let file = File::open(joined_path)
        .map_err(|err| CmapError::Filesystem(format!("open {}: {err}", joined_path.display())))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, Vec<JoinedRow>> = HashMap::new();

    for row in reader.deserialize::<JoinedRow>() {
        let row = row?;
        let label = size_label(row.size_frac_lower, row.size_frac_upper);
        let key = GroupKey::new(&row.centroid, &row.cruise_name, &label);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row);
    }

    let mut written = Vec::with_capacity(order.len());
    for key in order {
        let rows = &groups[&key];
        // Groups are keyed on centroid, so pident/qseqid are uniform within
        // one; the first row names the file.
        let qseqid = rows[0].qseqid.clone();
        let pident = rows[0].pident;
        let path = workspace.partition_path(&key, &qseqid, pident);
        write_partition(&path, &key, rows)?;
        debug!(path = %path, rows = rows.len(), "wrote partition");
        written.push(PartitionFile {
            path,
            key,
            qseqid,
            pident,
        });
    }

    Ok(written)
}

// Same serde path the join stage writes with, so numeric columns render
// identically in both files.
#[derive(Debug, Serialize)]
struct PartitionRow<'a> {
    centroid: &'a str,
    latitude: f64,
    longitude: f64,
    depth: f64,
    relative_abundance: f64,
    temperature: f64,
    salinity: f64,
    cruise_name: &'a str,
    size_frac_lower: f64,
    size_frac_upper: f64,
    pident: f64,
    qseqid: &'a str,
    size: &'a str,
}

impl<'a> PartitionRow<'a> {
    fn new(row: &'a JoinedRow, size: &'a str) -> Self {
        Self {
            centroid: &row.centroid,
            latitude: row.latitude,
            longitude: row.longitude,
            depth: row.depth,
            relative_abundance: row.relative_abundance,
            temperature: row.temperature,
            salinity: row.salinity,
            cruise_name: &row.cruise_name,
            size_frac_lower: row.size_frac_lower,
            size_frac_upper: row.size_frac_upper,
            pident: row.pident,
            qseqid: &row.qseqid,
            size,
        }
    }
}

fn write_partition(
    path: &Utf8PathBuf,
    key: &GroupKey,
    rows: &[JoinedRow],
) -> Result<(), CmapError> {
    let file = File::create(path.as_std_path())
        .map_err(|err| CmapError::Filesystem(format!("create {path}: {err}")))?;
    let mut writer = csv::Writer::from_writer(file);

    for row in rows {
        writer.serialize(PartitionRow::new(row, &key.size_label))?;
    }
    writer.flush().map_err(|err| CmapError::Csv(err.to_string()))?;
    Ok(())
}
