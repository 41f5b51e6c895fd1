use std::io::{self, Write};

use serde::Serialize;

use crate::app::PipelineReport;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &PipelineReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_report(report: &PipelineReport) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "hits: {}", report.hits_file)?;
        writeln!(
            stdout,
            "centroids: {} unique, {} unmatched",
            report.unique_centroids, report.unmatched_centroids
        )?;
        writeln!(
            stdout,
            "joined: {} rows -> {}",
            report.joined_rows, report.joined_file
        )?;
        writeln!(
            stdout,
            "partitions: {} files, {} plot jobs",
            report.partitions.len(),
            report.jobs_run
        )?;
        writeln!(stdout, "Done")?;
        Ok(())
    }
}
