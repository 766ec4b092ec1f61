//! Compute-once snapshot memoization.
//!
//! The map lock is held only long enough to fetch or insert the per-key
//! cell; the computation itself runs inside [`OnceLock::get_or_init`], so
//! concurrent requests for the same key block on that key alone and at
//! most one computation per key ever runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use statline_metrics_models::YearSnapshot;
use statline_region_models::RegionCode;

type Cell = Arc<OnceLock<YearSnapshot>>;

/// Memoized snapshots keyed by `(region_code, year)`.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    cells: Mutex<BTreeMap<(RegionCode, i32), Cell>>,
    computations: AtomicUsize,
}

impl SnapshotCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot for the key, running `compute` if this
    /// is the first request.
    pub fn get_or_compute(
        &self,
        code: &RegionCode,
        year: i32,
        compute: impl FnOnce() -> YearSnapshot,
    ) -> YearSnapshot {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cells.entry((code.clone(), year)).or_default())
        };

        cell.get_or_init(|| {
            self.computations.fetch_add(1, Ordering::Relaxed);
            log::debug!("Computing snapshot {code} {year}");
            compute()
        })
        .clone()
    }

    /// How many snapshots have actually been computed.
    #[must_use]
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    /// Number of keys seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no snapshot has been requested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
