use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::centroids::{CentroidRecord, CentroidStore};
use crate::error::CmapError;
use crate::hits::HitReader;

/// One line of the joined CSV: a centroid's environmental record plus the
/// provenance of the hit that matched it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedRow {
    pub centroid: String,
    pub latitude: f64,
    pub longitude: f64,
    pub depth: f64,
    pub relative_abundance: f64,
    pub temperature: f64,
    pub salinity: f64,
    pub cruise_name: String,
    pub size_frac_lower: f64,
    pub size_frac_upper: f64,
    pub pident: f64,
    pub qseqid: String,
}

impl JoinedRow {
    fn from_record(record: CentroidRecord, pident: f64, qseqid: &str) -> Self {
        // A missing or non-numeric upper bound falls back to the lower.
        let size_frac_upper = record.size_frac_upper.unwrap_or(record.size_frac_lower);
        Self {
            centroid: record.centroid,
            latitude: record.lat,
            longitude: record.lon,
            depth: record.depth,
            relative_abundance: record.relative_abundance,
            temperature: record.temperature,
            salinity: record.salinity,
            cruise_name: record.cruise_name,
            size_frac_lower: record.size_frac_lower,
            size_frac_upper,
            pident,
            qseqid: qseqid.to_string(),
        }
    }
}

pub const JOINED_HEADER: [&str; 12] = [
    "centroid",
    "latitude",
    "longitude",
    "depth",
    "relative_abundance",
    "temperature",
    "salinity",
    "cruise_name",
    "size_frac_lower",
    "size_frac_upper",
    "pident",
    "qseqid",
];

#[derive(Debug, Clone, Serialize)]
pub struct JoinSummary {
    pub rows_written: usize,
    pub unique_centroids: usize,
    pub unmatched_centroids: usize,
}

/// Streams the hits file, querying the store once per unique sseqid, and
/// appends every matched row to `out_path`. Centroids with no lookup rows
/// are warned about and skipped.
pub fn join_hits<C: CentroidStore>(
    hits_path: &Path,
    store: &C,
    out_path: &Path,
) -> Result<JoinSummary, CmapError> {
    let out_file = File::create(out_path)
        .map_err(|err| CmapError::Filesystem(format!("create {}: {err}", out_path.display())))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out_file);
    // The header goes out up front so an all-unmatched run still leaves a
    // well-formed (empty) joined CSV behind.
    writer.write_record(JOINED_HEADER)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut summary = JoinSummary {
        rows_written: 0,
        unique_centroids: 0,
        unmatched_centroids: 0,
    };

    for hit in HitReader::open(hits_path)? {
        let hit = hit?;
        if !seen.insert(hit.sseqid.clone()) {
            continue;
        }
        summary.unique_centroids += 1;

        let id = hit.centroid_id()?;
        debug!(centroid = %id, "centroids query");
        let records = store.lookup(&id)?;
        if records.is_empty() {
            warn!("found no match for centroid \"{id}\"");
            summary.unmatched_centroids += 1;
            continue;
        }

        for record in records {
            writer.serialize(JoinedRow::from_record(record, hit.pident, &hit.qseqid))?;
            summary.rows_written += 1;
        }
    }

    writer.flush().map_err(|err| CmapError::Csv(err.to_string()))?;
    Ok(summary)
}
