use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::domain::CentroidId;
use crate::error::CmapError;

/// One row of BLAST `-outfmt 6` tabular output. The field order is fixed
/// by BLAST; all twelve columns must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct BlastHit {
    pub qseqid: String,
    pub sseqid: String,
    pub pident: f64,
    pub length: u64,
    pub mismatch: u64,
    pub gapopen: u64,
    pub qstart: u64,
    pub qend: u64,
    pub sstart: u64,
    pub send: u64,
    pub evalue: f64,
    pub bitscore: f64,
}

impl BlastHit {
    pub fn centroid_id(&self) -> Result<CentroidId, CmapError> {
        self.sseqid.parse()
    }
}

/// Streaming reader over a hits file. Rows are yielded one at a time so a
/// large search result never has to be held in memory.
pub struct HitReader<R: Read> {
    inner: csv::Reader<R>,
    line: u64,
}

impl HitReader<File> {
    pub fn open(path: &Path) -> Result<Self, CmapError> {
        let file = File::open(path)
            .map_err(|err| CmapError::Filesystem(format!("open {}: {err}", path.display())))?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> HitReader<R> {
    pub fn from_reader(reader: R) -> Self {
        let inner = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .from_reader(reader);
        Self { inner, line: 0 }
    }
}

impl<R: Read> Iterator for HitReader<R> {
    type Item = Result<BlastHit, CmapError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.line += 1;
        let line = self.line;
        self.inner.deserialize().next().map(|result| {
            result.map_err(|err| CmapError::HitParse {
                line,
                message: err.to_string(),
            })
        })
    }
}
