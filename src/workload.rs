//! Parameterized request generators for the load generator
//!
//! Four workload shapes, each producing one operation per draw:
//!
//! | kind | operation |
//! |------|-----------|
//! | `put_all` | PUT a uniformly random key from the full domain |
//! | `get_all` | GET a uniformly random key from the primary keyspace |
//! | `get_popular` | GET a uniformly random key from the popular set |
//! | `mixed` | 80% popular GETs, 20% PUTs into the large write-only space |
//!
//! A `WorkloadKind` is the immutable description; `build`/`seeded` turn it
//! into a `Workload` holding its own random state, so every worker thread
//! draws from an independent stream. Operation generation is pure of
//! transport, which keeps per-seed determinism directly testable.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{
    Key, KEY_DOMAIN_MAX, LARGE_KEYSPACE_MIN, POPULAR_KEY_MAX, PRIMARY_KEYSPACE_MAX,
};

/// Share of mixed-workload draws that read the popular set
const MIXED_GET_PERCENT: u32 = 80;

/// One operation against the key-value server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Read the key
    Get(Key),
    /// Write `value_for(key)` to the key
    Put(Key),
}

/// Body used for every generated PUT
pub fn value_for(key: Key) -> String {
    format!("value-{key}")
}

/// The four workload shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    PutAll,
    GetAll,
    GetPopular,
    Mixed,
}

impl WorkloadKind {
    /// All kinds, in CLI order
    pub fn all() -> &'static [WorkloadKind] {
        &[
            WorkloadKind::PutAll,
            WorkloadKind::GetAll,
            WorkloadKind::GetPopular,
            WorkloadKind::Mixed,
        ]
    }

    /// CLI name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::PutAll => "put_all",
            WorkloadKind::GetAll => "get_all",
            WorkloadKind::GetPopular => "get_popular",
            WorkloadKind::Mixed => "mixed",
        }
    }

    /// Keys the workload expects to exist before timing starts
    ///
    /// `put_all` creates its own rows. The read-heavy workloads see a 404 on
    /// every miss until these keys are written, so the load generator offers
    /// the populate pass as an explicit step.
    pub fn prepare_keys(&self) -> Option<RangeInclusive<Key>> {
        match self {
            WorkloadKind::PutAll => None,
            WorkloadKind::GetAll => Some(1..=PRIMARY_KEYSPACE_MAX),
            WorkloadKind::GetPopular | WorkloadKind::Mixed => Some(1..=POPULAR_KEY_MAX),
        }
    }

    /// Build a per-worker instance owning the given random state
    pub fn build(self, rng: StdRng) -> Workload {
        Workload { kind: self, rng }
    }

    /// Build a deterministically seeded per-worker instance
    pub fn seeded(self, seed: u64) -> Workload {
        self.build(StdRng::seed_from_u64(seed))
    }

    /// Build an instance seeded from the OS entropy source
    pub fn from_entropy(self) -> Workload {
        self.build(StdRng::from_entropy())
    }
}

impl FromStr for WorkloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "put_all" => Ok(WorkloadKind::PutAll),
            "get_all" => Ok(WorkloadKind::GetAll),
            "get_popular" => Ok(WorkloadKind::GetPopular),
            "mixed" => Ok(WorkloadKind::Mixed),
            other => Err(format!(
                "unknown workload type '{other}' (expected put_all, get_all, get_popular, mixed)"
            )),
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workload kind bound to one worker's private random state
#[derive(Debug, Clone)]
pub struct Workload {
    kind: WorkloadKind,
    rng: StdRng,
}

impl Workload {
    /// The kind this instance draws from
    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }

    /// Draw the next operation
    pub fn next_op(&mut self) -> Op {
        match self.kind {
            WorkloadKind::PutAll => Op::Put(self.rng.gen_range(1..=KEY_DOMAIN_MAX)),
            WorkloadKind::GetAll => Op::Get(self.rng.gen_range(1..=PRIMARY_KEYSPACE_MAX)),
            WorkloadKind::GetPopular => Op::Get(self.rng.gen_range(1..=POPULAR_KEY_MAX)),
            WorkloadKind::Mixed => {
                if self.rng.gen_range(0..100) < MIXED_GET_PERCENT {
                    Op::Get(self.rng.gen_range(1..=POPULAR_KEY_MAX))
                } else {
                    Op::Put(self.rng.gen_range(LARGE_KEYSPACE_MIN..=KEY_DOMAIN_MAX))
                }
            }
        }
    }
}
