//! Test-run records and the results file
//!
//! Every load-generator run appends one record to a results file holding a
//! single top-level JSON array. An absent, empty, or malformed file is
//! rewritten as a one-element array. The append assumes a single generator
//! process; it is not safe against concurrent writers.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// One record per load-generator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub threads: usize,
    pub workload_type: String,
    pub duration_sec: u64,
    pub requests: u64,
    pub errors: u64,
    /// Successful requests per second over the wall-clock run
    pub throughput: f64,
    /// Mean round-trip time of successful requests, milliseconds
    pub avg_response_ms: f64,
    /// Mean host CPU utilization during the run, percent
    pub avg_cpu_percent: f64,
    /// Mean disk read throughput, KiB/s (historical key name in the file)
    #[serde(rename = "avg_disk_util")]
    pub avg_disk_read_kbps: f64,
    /// Mean disk write throughput, KiB/s
    pub avg_disk_write_kbps: f64,
}

impl TestResult {
    /// Copy with float fields rounded to two decimals, as written to disk
    pub fn rounded(&self) -> Self {
        Self {
            throughput: round2(self.throughput),
            avg_response_ms: round2(self.avg_response_ms),
            avg_cpu_percent: round2(self.avg_cpu_percent),
            avg_disk_read_kbps: round2(self.avg_disk_read_kbps),
            avg_disk_write_kbps: round2(self.avg_disk_write_kbps),
            ..self.clone()
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Append a record to the results file, keeping it a single JSON array
pub fn append_result(path: &Path, result: &TestResult) -> Result<()> {
    let mut records: Vec<serde_json::Value> = match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(
                path = %path.display(),
                error = %e,
                "Results file is not a JSON array, rewriting"
            );
            Vec::new()
        }),
        Err(_) => Vec::new(),
    };

    records.push(serde_json::to_value(result.rounded())?);
    fs::write(path, format!("{}\n", serde_json::to_string(&records)?))?;
    Ok(())
}
