use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use blast2cmap::centroids::{CentroidRecord, CentroidStore};
use blast2cmap::domain::CentroidId;
use blast2cmap::error::CmapError;
use blast2cmap::join::{JoinedRow, join_hits};

struct MockStore {
    records: HashMap<String, Vec<CentroidRecord>>,
    calls: Mutex<Vec<String>>,
}

impl MockStore {
    fn new(records: HashMap<String, Vec<CentroidRecord>>) -> Self {
        Self {
            records,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl CentroidStore for MockStore {
    fn lookup(&self, id: &CentroidId) -> Result<Vec<CentroidRecord>, CmapError> {
        self.calls.lock().unwrap().push(id.as_str().to_string());
        Ok(self.records.get(id.as_str()).cloned().unwrap_or_default())
    }
}

fn record(centroid: &str, cruise: &str, lower: f64, upper: Option<f64>) -> CentroidRecord {
    CentroidRecord {
        centroid: centroid.to_string(),
        lat: 31.5,
        lon: -64.1,
        depth: 5.0,
        relative_abundance: 0.01,
        temperature: 23.4,
        salinity: 36.6,
        cruise_name: cruise.to_string(),
        size_frac_lower: lower,
        size_frac_upper: upper,
    }
}

fn hit_line(qseqid: &str, sseqid: &str, pident: f64) -> String {
    format!("{qseqid}\t{sseqid}\t{pident}\t250\t3\t1\t1\t250\t10\t260\t1e-100\t450.2\n")
}

fn read_rows(path: &std::path::Path) -> Vec<JoinedRow> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.deserialize().map(|row| row.unwrap()).collect()
}

#[test]
fn duplicate_sseqids_are_looked_up_once() {
    let temp = tempfile::tempdir().unwrap();
    let hits = temp.path().join("hits.tab");
    fs::write(
        &hits,
        hit_line("q1", "c1", 98.5) + &hit_line("q1", "c1", 97.2) + &hit_line("q1", "c2", 99.0),
    )
    .unwrap();

    let mut records = HashMap::new();
    records.insert("c1".to_string(), vec![record("c1", "TN397", 0.2, Some(3.0))]);
    records.insert("c2".to_string(), vec![record("c2", "KOK1606", 0.8, Some(1.2))]);
    let store = MockStore::new(records);

    let out = temp.path().join("oce-input.csv");
    let summary = join_hits(&hits, &store, &out).unwrap();

    assert_eq!(summary.unique_centroids, 2);
    assert_eq!(summary.rows_written, 2);
    let calls = store.calls.lock().unwrap();
    assert_eq!(*calls, vec!["c1".to_string(), "c2".to_string()]);
}

#[test]
fn unmatched_centroid_is_skipped_not_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let hits = temp.path().join("hits.tab");
    fs::write(&hits, hit_line("q1", "ghost", 98.5) + &hit_line("q1", "c1", 97.0)).unwrap();

    let mut records = HashMap::new();
    records.insert("c1".to_string(), vec![record("c1", "TN397", 0.2, Some(3.0))]);
    let store = MockStore::new(records);

    let out = temp.path().join("oce-input.csv");
    let summary = join_hits(&hits, &store, &out).unwrap();

    assert_eq!(summary.unmatched_centroids, 1);
    assert_eq!(summary.rows_written, 1);
    let rows = read_rows(&out);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].centroid, "c1");
    assert!(rows.iter().all(|row| row.centroid != "ghost"));
}

#[test]
fn missing_upper_bound_falls_back_to_lower() {
    let temp = tempfile::tempdir().unwrap();
    let hits = temp.path().join("hits.tab");
    fs::write(&hits, hit_line("q1", "c1", 98.5)).unwrap();

    let mut records = HashMap::new();
    records.insert("c1".to_string(), vec![record("c1", "TN397", 0.22, None)]);
    let store = MockStore::new(records);

    let out = temp.path().join("oce-input.csv");
    join_hits(&hits, &store, &out).unwrap();

    let rows = read_rows(&out);
    assert_eq!(rows[0].size_frac_lower, 0.22);
    assert_eq!(rows[0].size_frac_upper, 0.22);
}

#[test]
fn one_hit_can_fan_out_to_many_rows() {
    let temp = tempfile::tempdir().unwrap();
    let hits = temp.path().join("hits.tab");
    fs::write(&hits, hit_line("q1", "c1", 98.5)).unwrap();

    let mut records = HashMap::new();
    records.insert(
        "c1".to_string(),
        vec![
            record("c1", "TN397", 0.2, Some(3.0)),
            record("c1", "KOK1606", 0.2, Some(3.0)),
        ],
    );
    let store = MockStore::new(records);

    let out = temp.path().join("oce-input.csv");
    let summary = join_hits(&hits, &store, &out).unwrap();

    assert_eq!(summary.rows_written, 2);
    let rows = read_rows(&out);
    assert!(rows.iter().all(|row| row.pident == 98.5 && row.qseqid == "q1"));
}

#[test]
fn all_unmatched_leaves_header_only_csv() {
    let temp = tempfile::tempdir().unwrap();
    let hits = temp.path().join("hits.tab");
    fs::write(&hits, hit_line("q1", "ghost", 98.5)).unwrap();

    let store = MockStore::new(HashMap::new());
    let out = temp.path().join("oce-input.csv");
    let summary = join_hits(&hits, &store, &out).unwrap();

    assert_eq!(summary.rows_written, 0);
    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("centroid,latitude,longitude"));
}
