use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use rusqlite::Connection;
use rusqlite::types::Value;
use serde::Deserialize;

use crate::domain::CentroidId;
use crate::error::CmapError;

pub const QUERY_FIELDS: [&str; 10] = [
    "centroid",
    "lat",
    "lon",
    "depth",
    "relative_abundance",
    "esv_temperature",
    "esv_salinity",
    "cruise_name",
    "size_frac_lower",
    "size_frac_upper",
];

/// Environmental metadata for one centroid observation. `size_frac_upper`
/// is `None` when the stored value is missing or non-numeric; the join
/// stage substitutes the lower bound.
#[derive(Debug, Clone)]
pub struct CentroidRecord {
    pub centroid: String,
    pub lat: f64,
    pub lon: f64,
    pub depth: f64,
    pub relative_abundance: f64,
    pub temperature: f64,
    pub salinity: f64,
    pub cruise_name: String,
    pub size_frac_lower: f64,
    pub size_frac_upper: Option<f64>,
}

pub trait CentroidStore {
    fn lookup(&self, id: &CentroidId) -> Result<Vec<CentroidRecord>, CmapError>;
}

/// Local single-file SQLite store, as produced by the centroids-db build
/// script.
pub struct SqliteCentroids {
    conn: Connection,
}

impl SqliteCentroids {
    pub fn open(path: &Path) -> Result<Self, CmapError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    fn select_sql() -> String {
        format!(
            "select {} from tblesv where centroid = ?1",
            QUERY_FIELDS.join(", ")
        )
    }
}

impl CentroidStore for SqliteCentroids {
    fn lookup(&self, id: &CentroidId) -> Result<Vec<CentroidRecord>, CmapError> {
        let mut stmt = self.conn.prepare_cached(&Self::select_sql())?;
        let rows = stmt.query_map([id.as_str()], |row| {
            Ok(CentroidRecord {
                centroid: coerce_string(row.get::<_, Value>(0)?),
                lat: coerce_f64(row.get::<_, Value>(1)?).unwrap_or(f64::NAN),
                lon: coerce_f64(row.get::<_, Value>(2)?).unwrap_or(f64::NAN),
                depth: coerce_f64(row.get::<_, Value>(3)?).unwrap_or(f64::NAN),
                relative_abundance: coerce_f64(row.get::<_, Value>(4)?).unwrap_or(f64::NAN),
                temperature: coerce_f64(row.get::<_, Value>(5)?).unwrap_or(f64::NAN),
                salinity: coerce_f64(row.get::<_, Value>(6)?).unwrap_or(f64::NAN),
                cruise_name: coerce_string(row.get::<_, Value>(7)?),
                size_frac_lower: coerce_f64(row.get::<_, Value>(8)?).unwrap_or(f64::NAN),
                size_frac_upper: coerce_f64(row.get::<_, Value>(9)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(CmapError::from)
    }
}

// The build script inserts stringified values, so a column may hold text
// where a number is expected.
fn coerce_f64(value: Value) -> Option<f64> {
    match value {
        Value::Integer(v) => Some(v as f64),
        Value::Real(v) => Some(v),
        Value::Text(v) => coerce_str_f64(&v),
        Value::Null | Value::Blob(_) => None,
    }
}

fn coerce_str_f64(value: &str) -> Option<f64> {
    value.trim().parse().ok()
}

fn coerce_string(value: Value) -> String {
    match value {
        Value::Text(v) => v.trim().to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => v.to_string(),
        Value::Null | Value::Blob(_) => String::new(),
    }
}

/// Remote CMAP query service. Sends the same keyed SELECT to the data
/// endpoint and reads the CSV response.
pub struct CmapHttpClient {
    client: Client,
    base_url: String,
    api_key: String,
}

// Every numeric column comes in as text; the source data carries
// stringified non-numerics ("None", "nan", empty) that must not abort the
// lookup. They get the same coercion the SQLite path applies.
#[derive(Debug, Deserialize)]
struct CmapCsvRow {
    centroid: String,
    lat: String,
    lon: String,
    depth: String,
    relative_abundance: String,
    esv_temperature: String,
    esv_salinity: String,
    cruise_name: String,
    size_frac_lower: String,
    size_frac_upper: String,
}

impl CmapCsvRow {
    fn into_record(self) -> CentroidRecord {
        CentroidRecord {
            centroid: self.centroid.trim().to_string(),
            lat: coerce_str_f64(&self.lat).unwrap_or(f64::NAN),
            lon: coerce_str_f64(&self.lon).unwrap_or(f64::NAN),
            depth: coerce_str_f64(&self.depth).unwrap_or(f64::NAN),
            relative_abundance: coerce_str_f64(&self.relative_abundance).unwrap_or(f64::NAN),
            temperature: coerce_str_f64(&self.esv_temperature).unwrap_or(f64::NAN),
            salinity: coerce_str_f64(&self.esv_salinity).unwrap_or(f64::NAN),
            cruise_name: self.cruise_name.trim().to_string(),
            size_frac_lower: coerce_str_f64(&self.size_frac_lower).unwrap_or(f64::NAN),
            size_frac_upper: coerce_str_f64(&self.size_frac_upper),
        }
    }
}

impl CmapHttpClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://simonscmap.com";

    pub fn new() -> Result<Self, CmapError> {
        let api_key = std::env::var("CMAP_API_KEY").map_err(|_| CmapError::MissingApiKey)?;
        Self::with_base_url(Self::DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self, CmapError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("blast2cmap/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CmapError::CmapHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| CmapError::CmapHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn query_sql(id: &CentroidId) -> String {
        format!(
            "select {} from tblesv where centroid = '{}'",
            QUERY_FIELDS.join(", "),
            id.as_str().replace('\'', "''")
        )
    }
}

impl CentroidStore for CmapHttpClient {
    fn lookup(&self, id: &CentroidId) -> Result<Vec<CentroidRecord>, CmapError> {
        let url = format!("{}/api/data/query", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .query(&[("query", Self::query_sql(id))])
            .send()
            .map_err(|err| CmapError::CmapHttp(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "CMAP request failed".to_string());
            return Err(CmapError::CmapStatus { status, message });
        }

        let body = response
            .text()
            .map_err(|err| CmapError::CmapHttp(err.to_string()))?;
        parse_cmap_csv(&body)
    }
}

fn parse_cmap_csv(body: &str) -> Result<Vec<CentroidRecord>, CmapError> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let mut records = Vec::new();
    for row in reader.deserialize::<CmapCsvRow>() {
        records.push(row?.into_record());
    }
    Ok(records)
}
