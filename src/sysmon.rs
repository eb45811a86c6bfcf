//! Host metric sampling for the load generator
//!
//! While a test runs, a dedicated thread samples once per second:
//!
//! - CPU utilization, from the aggregate `cpu` line of `/proc/stat`
//! - Disk read/write throughput, by differencing the cumulative sector
//!   counters in `/proc/diskstats` (512-byte sectors, reported as KiB/s)
//!
//! `loop*` and `ram*` pseudo-devices are discarded. Samples accumulate in
//! plain vectors; when the stop flag flips, the arithmetic mean of each
//! vector becomes the reported average. Parsing is split out as pure
//! functions over the file contents so it can be tested against fixtures.

use std::fs;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::warn;

/// Bytes per sector in `/proc/diskstats`
const SECTOR_SIZE_BYTES: u64 = 512;

const PROC_STAT: &str = "/proc/stat";
const PROC_DISKSTATS: &str = "/proc/diskstats";

/// Aggregate CPU jiffies split into busy and total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTimes {
    /// Jiffies spent outside idle and iowait
    pub busy: u64,
    /// All jiffies
    pub total: u64,
}

/// Sector counters summed over physical block devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskCounters {
    pub sectors_read: u64,
    pub sectors_written: u64,
}

/// Averages reported for a completed test run
#[derive(Debug, Clone, Copy, Default)]
pub struct HostAverages {
    pub cpu_percent: f64,
    pub disk_read_kbps: f64,
    pub disk_write_kbps: f64,
}

/// Parse the aggregate `cpu` line of a `/proc/stat` snapshot
///
/// Returns `None` when the line is missing or malformed. Idle is counted as
/// idle + iowait; everything else is busy.
pub fn parse_cpu_line(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|line| line.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|field| field.parse().ok())
        .collect();
    if fields.len() < 4 {
        return None;
    }

    let total: u64 = fields.iter().sum();
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        busy: total.saturating_sub(idle),
        total,
    })
}

/// CPU utilization percentage between two snapshots
pub fn cpu_percent(prev: CpuTimes, next: CpuTimes) -> f64 {
    let total = next.total.saturating_sub(prev.total);
    if total == 0 {
        return 0.0;
    }
    let busy = next.busy.saturating_sub(prev.busy);
    busy as f64 / total as f64 * 100.0
}

/// Sum sector counters over the physical devices of a `/proc/diskstats`
/// snapshot, skipping `loop*` and `ram*` pseudo-devices
pub fn parse_diskstats(content: &str) -> DiskCounters {
    let mut counters = DiskCounters::default();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        // major minor name reads merged sectors_read ms writes merged sectors_written ...
        if fields.len() < 10 {
            continue;
        }
        let name = fields[2];
        if name.starts_with("loop") || name.starts_with("ram") {
            continue;
        }
        counters.sectors_read += fields[5].parse().unwrap_or(0);
        counters.sectors_written += fields[9].parse().unwrap_or(0);
    }
    counters
}

/// Sector delta converted to KiB/s over an interval
pub fn sectors_to_kbps(delta_sectors: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    (delta_sectors * SECTOR_SIZE_BYTES) as f64 / 1024.0 / elapsed_secs
}

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn read_cpu_times() -> io::Result<Option<CpuTimes>> {
    Ok(parse_cpu_line(&fs::read_to_string(PROC_STAT)?))
}

fn read_disk_counters() -> io::Result<DiskCounters> {
    Ok(parse_diskstats(&fs::read_to_string(PROC_DISKSTATS)?))
}

/// Samples host CPU and disk counters on a fixed cadence until stopped
pub struct HostSampler {
    interval: Duration,
}

impl HostSampler {
    /// Sampler with the standard 1-second cadence
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(1))
    }

    /// Sampler with a custom cadence
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run the sampling loop on the calling thread until `stop` is set,
    /// then reduce the collected samples to their means
    ///
    /// A failed read skips that sample and keeps the loop alive.
    pub fn run(&self, stop: &AtomicBool) -> HostAverages {
        let mut cpu_samples = Vec::new();
        let mut read_samples = Vec::new();
        let mut write_samples = Vec::new();

        let mut prev_cpu = match read_cpu_times() {
            Ok(times) => times,
            Err(e) => {
                warn!(error = %e, "CPU counters unavailable");
                None
            }
        };
        let mut prev_disk = match read_disk_counters() {
            Ok(counters) => Some(counters),
            Err(e) => {
                warn!(error = %e, "Disk counters unavailable");
                None
            }
        };
        let mut prev_at = Instant::now();

        while !stop.load(Ordering::Relaxed) {
            std::thread::sleep(self.interval);
            let now = Instant::now();
            let elapsed = now.duration_since(prev_at).as_secs_f64();

            match read_cpu_times() {
                Ok(Some(cpu)) => {
                    if let Some(prev) = prev_cpu {
                        cpu_samples.push(cpu_percent(prev, cpu));
                    }
                    prev_cpu = Some(cpu);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "CPU sample failed"),
            }

            match read_disk_counters() {
                Ok(disk) => {
                    if let Some(prev) = prev_disk {
                        read_samples.push(sectors_to_kbps(
                            disk.sectors_read.saturating_sub(prev.sectors_read),
                            elapsed,
                        ));
                        write_samples.push(sectors_to_kbps(
                            disk.sectors_written.saturating_sub(prev.sectors_written),
                            elapsed,
                        ));
                    }
                    prev_disk = Some(disk);
                }
                Err(e) => warn!(error = %e, "Disk sample failed"),
            }

            prev_at = now;
        }

        HostAverages {
            cpu_percent: mean(&cpu_samples),
            disk_read_kbps: mean(&read_samples),
            disk_write_kbps: mean(&write_samples),
        }
    }
}

impl Default for HostSampler {
    fn default() -> Self {
        Self::new()
    }
}
