//! Lookup table backend selection.
//!
//! The backend is chosen once from a capability probe rather than by trying the accelerated path
//! and catching failures, so every outcome is an enumerable [`LutBackend`] value.

use pixelrts_common::cpu_detect::has_parallel_workers;

/// The compute backend used to build lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LutBackend {
    /// Single-threaded walk over the curve.
    Scalar,
    /// Data-parallel build on the rayon thread pool.
    Parallel,
}

impl LutBackend {
    /// Picks the fastest backend available on this machine.
    pub fn detect() -> Self {
        if Self::Parallel.is_available() {
            Self::Parallel
        } else {
            Self::Scalar
        }
    }

    /// Checks whether this backend can run in the current build and on the current machine.
    pub fn is_available(self) -> bool {
        match self {
            Self::Scalar => true,
            Self::Parallel => cfg!(feature = "parallel") && has_parallel_workers(),
        }
    }

    /// Returns this backend if available, otherwise [`LutBackend::Scalar`].
    ///
    /// Both backends produce identical tables, so the substitution is invisible to callers.
    pub fn resolve(self) -> Self {
        if self.is_available() {
            self
        } else {
            log::warn!("{self:?} lookup table backend unavailable, using scalar backend");
            Self::Scalar
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_is_always_available() {
        assert!(LutBackend::Scalar.is_available());
        assert_eq!(LutBackend::Scalar.resolve(), LutBackend::Scalar);
    }

    #[test]
    fn detected_backend_is_available() {
        let backend = LutBackend::detect();
        assert!(backend.is_available());
        assert_eq!(backend.resolve(), backend);
    }
}
