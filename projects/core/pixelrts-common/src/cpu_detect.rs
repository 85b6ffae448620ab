//! Helpers for runtime capability detection.
//!
//! The probes run once; every subsequent call loads a cached value.

use std::sync::OnceLock;
use std::thread;

static AVAILABLE_WORKERS: OnceLock<usize> = OnceLock::new();

/// Returns the number of hardware threads available to this process.
///
/// Falls back to `1` when the platform cannot report it.
#[inline]
pub fn available_workers() -> usize {
    *AVAILABLE_WORKERS.get_or_init(|| {
        thread::available_parallelism()
            .map(|count| count.get())
            .unwrap_or(1)
    })
}

/// Checks if more than one worker thread can run concurrently.
///
/// # Returns
/// `true` if data-parallel code paths are worth dispatching, `false` otherwise.
#[inline]
pub fn has_parallel_workers() -> bool {
    available_workers() > 1
}
