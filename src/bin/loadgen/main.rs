//! Closed-loop load generator binary
//!
//! Usage: `loadgen <host> <port> <threads> <duration_sec> <workload_type> [seed]`
//!
//! Spawns `threads` closed-loop workers against the target server for a
//! fixed wall-clock duration, samples host CPU and disk counters in
//! parallel, and appends one record to the results file. With a seed, each
//! worker draws from `seed + worker_index`; without one, from OS entropy.

mod worker;

use std::path::PathBuf;
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info};

use cachefront::report::{append_result, TestResult};
use cachefront::sysmon::{HostAverages, HostSampler};
use cachefront::types::LoadTotals;
use cachefront::workload::WorkloadKind;

#[derive(Debug, Parser)]
#[command(name = "loadgen", about = "Closed-loop load generator for the key-value server")]
struct Cli {
    /// Server hostname
    host: String,

    /// Server port
    port: u16,

    /// Number of closed-loop worker threads
    threads: usize,

    /// Test duration in seconds
    duration_sec: u64,

    /// Workload type: put_all, get_all, get_popular, mixed
    workload_type: WorkloadKind,

    /// Base seed; worker i uses seed + i. Omit for entropy seeding
    seed: Option<u64>,

    /// Run the workload's populate step before timing starts
    #[arg(long)]
    prepare: bool,

    /// Results file path
    #[arg(long, default_value = "results.json")]
    results: PathBuf,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            exit(1);
        }
    };
    if cli.threads == 0 || cli.duration_sec == 0 {
        error!("Thread count and duration must be greater than 0");
        exit(1);
    }

    let base_url = format!("http://{}:{}", cli.host, cli.port);
    info!(
        target = %base_url,
        threads = cli.threads,
        duration_sec = cli.duration_sec,
        workload = %cli.workload_type,
        seed = ?cli.seed,
        "Starting load test"
    );

    if cli.prepare {
        if let Err(e) = worker::run_prepare(&base_url, cli.workload_type) {
            error!(error = %e, "Prepare step failed");
            exit(1);
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    let totals = Arc::new(LoadTotals::new());

    let sampler_stop = Arc::clone(&stop);
    let sampler = thread::spawn(move || HostSampler::new().run(&sampler_stop));

    let started = Instant::now();
    let mut workers = Vec::with_capacity(cli.threads);
    for i in 0..cli.threads {
        let workload = match cli.seed {
            Some(seed) => cli.workload_type.seeded(seed + i as u64),
            None => cli.workload_type.from_entropy(),
        };
        let base_url = base_url.clone();
        let stop = Arc::clone(&stop);
        let totals = Arc::clone(&totals);
        workers.push(thread::spawn(move || {
            worker::run_worker(&base_url, workload, &stop, &totals)
        }));
    }

    thread::sleep(Duration::from_secs(cli.duration_sec));
    stop.store(true, Ordering::Relaxed);
    info!("Stopping test and joining workers");

    for handle in workers {
        if handle.join().is_err() {
            error!("Worker thread panicked");
        }
    }
    let host_averages = match sampler.join() {
        Ok(averages) => averages,
        Err(_) => {
            error!("Sampler thread panicked");
            HostAverages::default()
        }
    };
    let elapsed = started.elapsed().as_secs_f64();

    let requests = totals.requests();
    let errors = totals.errors();
    let throughput = if elapsed > 0.0 {
        requests as f64 / elapsed
    } else {
        0.0
    };

    let result = TestResult {
        threads: cli.threads,
        workload_type: cli.workload_type.to_string(),
        duration_sec: cli.duration_sec,
        requests,
        errors,
        throughput,
        avg_response_ms: totals.avg_response_ms(),
        avg_cpu_percent: host_averages.cpu_percent,
        avg_disk_read_kbps: host_averages.disk_read_kbps,
        avg_disk_write_kbps: host_averages.disk_write_kbps,
    };

    info!(
        requests,
        errors,
        throughput = result.throughput,
        avg_response_ms = result.avg_response_ms,
        avg_cpu_percent = result.avg_cpu_percent,
        "Test complete"
    );

    if let Err(e) = append_result(&cli.results, &result) {
        error!(error = %e, path = %cli.results.display(), "Failed to write results");
        exit(1);
    }
    info!(path = %cli.results.display(), "Result appended");
}
