use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CmapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BlastProgram {
    Blastn,
    Tblastn,
}

impl fmt::Display for BlastProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlastProgram::Blastn => write!(f, "blastn"),
            BlastProgram::Tblastn => write!(f, "tblastn"),
        }
    }
}

impl FromStr for BlastProgram {
    type Err = CmapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "blastn" => Ok(BlastProgram::Blastn),
            "tblastn" => Ok(BlastProgram::Tblastn),
            _ => Err(CmapError::InvalidProgram(value.to_string())),
        }
    }
}

/// Subject-sequence key used to join BLAST hits against the centroid table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CentroidId(String);

impl CentroidId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CentroidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CentroidId {
    type Err = CmapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(CmapError::InvalidCentroidId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// One partition of the joined rows: every distinct combination of
/// centroid, cruise, and size-fraction label gets its own file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub centroid: String,
    pub cruise_name: String,
    pub size_label: String,
}

impl GroupKey {
    pub fn new(centroid: &str, cruise_name: &str, size_label: &str) -> Self {
        Self {
            centroid: centroid.to_string(),
            cruise_name: cruise_name.to_string(),
            size_label: size_label.to_string(),
        }
    }
}

/// Label for a size-fraction range, e.g. "0.2-3".
pub fn size_label(lower: f64, upper: f64) -> String {
    format!("{lower}-{upper}")
}
