//! Closed-loop worker threads and the prepare step

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, info};

use cachefront::error::{Error, Result};
use cachefront::types::LoadTotals;
use cachefront::workload::{value_for, Op, Workload, WorkloadKind};

/// Client-side request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Keys between progress lines during the prepare step
const PREPARE_PROGRESS_EVERY: i32 = 100_000;

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .tcp_nodelay(true)
        .build()
        .map_err(|e| Error::Internal(format!("HTTP client: {e}")))
}

fn execute(client: &Client, base_url: &str, op: Op) -> reqwest::Result<u16> {
    let response = match op {
        Op::Get(key) => client.get(format!("{base_url}/{key}")).send()?,
        Op::Put(key) => client
            .put(format!("{base_url}/{key}"))
            .header(CONTENT_TYPE, "text/plain")
            .body(value_for(key))
            .send()?,
    };
    Ok(response.status().as_u16())
}

/// One closed-loop worker: draw an operation, time the round trip, repeat
/// until the stop flag flips
///
/// A 200 response counts as a success and its round trip is timed; any
/// other status or transport failure counts as an untimed error. Counters
/// stay thread-private until the single fold on exit.
pub fn run_worker(base_url: &str, mut workload: Workload, stop: &AtomicBool, totals: &LoadTotals) {
    let client = match build_client() {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Worker could not build its HTTP client");
            totals.fold(0, 1, 0);
            return;
        }
    };

    let mut requests = 0u64;
    let mut errors = 0u64;
    let mut latency_micros = 0u64;

    while !stop.load(Ordering::Relaxed) {
        let op = workload.next_op();
        let started = Instant::now();
        match execute(&client, base_url, op) {
            Ok(200) => {
                requests += 1;
                latency_micros += started.elapsed().as_micros() as u64;
            }
            Ok(_) | Err(_) => errors += 1,
        }
    }

    totals.fold(requests, errors, latency_micros);
}

/// Populate the keys a workload expects before timing starts
pub fn run_prepare(base_url: &str, kind: WorkloadKind) -> Result<()> {
    let Some(keys) = kind.prepare_keys() else {
        info!(workload = %kind, "Workload needs no preparation");
        return Ok(());
    };

    let client = build_client()?;
    let total = (*keys.end() - *keys.start() + 1) as u64;
    info!(workload = %kind, keys = total, "Preparing keyspace");

    let mut prepared = 0u64;
    let mut errors = 0u64;
    for key in keys {
        match execute(&client, base_url, Op::Put(key)) {
            Ok(200) => prepared += 1,
            Ok(status) => {
                errors += 1;
                debug!(key, status, "Prepare PUT rejected");
            }
            Err(e) => {
                errors += 1;
                debug!(key, error = %e, "Prepare PUT failed");
            }
        }
        if key % PREPARE_PROGRESS_EVERY == 0 {
            info!(prepared, errors, "Prepare progress");
        }
    }

    info!(prepared, errors, "Prepare complete");
    if prepared == 0 {
        return Err(Error::Internal(
            "prepare step failed for every key".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    // Port 1 is never serving; connections are refused immediately
    const DEAD_SERVER: &str = "http://127.0.0.1:1";

    #[test]
    fn test_worker_counts_transport_failures_as_errors() {
        let stop = Arc::new(AtomicBool::new(false));
        let totals = Arc::new(LoadTotals::new());

        let flag = Arc::clone(&stop);
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            flag.store(true, Ordering::Relaxed);
        });

        let workload = WorkloadKind::GetPopular.seeded(1);
        run_worker(DEAD_SERVER, workload, &stop, &totals);
        stopper.join().unwrap();

        assert_eq!(totals.requests(), 0);
        assert!(totals.errors() > 0);
        // Failures are never timed
        assert_eq!(totals.latency_micros(), 0);
    }

    #[test]
    fn test_prepare_fails_when_no_key_lands() {
        assert!(run_prepare(DEAD_SERVER, WorkloadKind::GetPopular).is_err());
    }

    #[test]
    fn test_prepare_is_a_noop_for_put_all() {
        // No keys to populate, so an unreachable server is not an error
        assert!(run_prepare(DEAD_SERVER, WorkloadKind::PutAll).is_ok());
    }
}
