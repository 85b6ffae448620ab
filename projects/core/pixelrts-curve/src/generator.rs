//! Blocking and non-blocking lookup table generation.
//!
//! A [`LutGenerator`] owns the backend used for generation. [`LutGenerator::dispatch`] hands out a
//! [`LutJob`] that mutably borrows the generator, so a second generation cannot be scheduled on the
//! same generator until the previous job has been waited on or dropped.

use crate::backend::LutBackend;
use crate::error::{CurveError, CurveResult};
use crate::hilbert::HilbertCurve;
use crate::lut::HilbertLut;
use crate::texture::LutTexture;
use core::marker::PhantomData;
use std::sync::mpsc::{Receiver, TryRecvError};

/// The product of one generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LutOutput {
    /// Index <-> coordinate table.
    pub lut: HilbertLut,
    /// Packed texture, present if the generator was configured to emit one.
    pub texture: Option<LutTexture>,
    /// Backend that produced the table.
    pub backend: LutBackend,
}

/// Builds Hilbert lookup tables on a fixed backend.
#[derive(Debug)]
pub struct LutGenerator {
    backend: LutBackend,
    emit_texture: bool,
}

impl Default for LutGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl LutGenerator {
    /// Creates a generator on the best backend this machine offers.
    pub fn new() -> Self {
        Self::with_backend(LutBackend::detect())
    }

    /// Creates a generator on a specific backend, degrading to scalar if it is unavailable.
    pub fn with_backend(backend: LutBackend) -> Self {
        Self {
            backend: backend.resolve(),
            emit_texture: false,
        }
    }

    /// Sets whether generated output includes a [`LutTexture`].
    pub fn emit_texture(mut self, emit: bool) -> Self {
        self.emit_texture = emit;
        self
    }

    /// Backend this generator runs on.
    #[inline]
    pub fn backend(&self) -> LutBackend {
        self.backend
    }

    /// Generates the table for `order`, blocking until it is ready.
    ///
    /// # Errors
    ///
    /// - [`CurveError::OrderTooLarge`] if `order` exceeds [`HilbertCurve::MAX_ORDER`].
    /// - [`CurveError::WorkerDisconnected`] if a background worker died mid-build.
    pub fn generate(&mut self, order: u32) -> CurveResult<LutOutput> {
        self.dispatch(order)?.wait()
    }

    /// Starts generating the table for `order`.
    ///
    /// On the scalar backend the work happens inline and the returned job is already complete.
    /// On the parallel backend the build runs on the rayon pool while the caller continues.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OrderTooLarge`] if `order` exceeds [`HilbertCurve::MAX_ORDER`].
    pub fn dispatch(&mut self, order: u32) -> CurveResult<LutJob<'_>> {
        let curve = HilbertCurve::new(order)?;
        let backend = self.backend;
        let emit_texture = self.emit_texture;
        log::debug!("Generating order {order} lookup table on {backend:?} backend");

        let state = match backend {
            LutBackend::Scalar => JobState::Ready(build_output(curve, backend, emit_texture)),
            LutBackend::Parallel => spawn_build(curve, backend, emit_texture),
        };

        Ok(LutJob {
            state,
            _generator: PhantomData,
        })
    }
}

/// A lookup table generation in flight.
///
/// The table is only readable once [`LutJob::wait`] returns, or after [`LutJob::is_ready`] has
/// reported `true`.
#[derive(Debug)]
#[must_use = "a dispatched job does nothing useful unless waited on"]
pub struct LutJob<'a> {
    state: JobState,
    _generator: PhantomData<&'a mut LutGenerator>,
}

#[derive(Debug)]
enum JobState {
    Ready(LutOutput),
    Pending(Receiver<LutOutput>),
    Failed,
}

impl LutJob<'_> {
    /// Checks whether the table has been produced, without blocking.
    pub fn is_ready(&mut self) -> bool {
        if let JobState::Pending(receiver) = &self.state {
            match receiver.try_recv() {
                Ok(output) => self.state = JobState::Ready(output),
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => self.state = JobState::Failed,
            }
        }
        true
    }

    /// Blocks until the table is produced and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::WorkerDisconnected`] if the background worker died mid-build.
    pub fn wait(self) -> CurveResult<LutOutput> {
        match self.state {
            JobState::Ready(output) => Ok(output),
            JobState::Pending(receiver) => {
                receiver.recv().map_err(|_| CurveError::WorkerDisconnected)
            }
            JobState::Failed => Err(CurveError::WorkerDisconnected),
        }
    }
}

fn build_output(curve: HilbertCurve, backend: LutBackend, emit_texture: bool) -> LutOutput {
    let lut = HilbertLut::build(curve, backend);
    let texture = emit_texture.then(|| LutTexture::from_lut(&lut));
    LutOutput {
        lut,
        texture,
        backend,
    }
}

#[cfg(feature = "parallel")]
fn spawn_build(curve: HilbertCurve, backend: LutBackend, emit_texture: bool) -> JobState {
    let (sender, receiver) = std::sync::mpsc::sync_channel(1);
    rayon::spawn(move || {
        // The job may have been dropped; nobody is waiting for the table then.
        let _ = sender.send(build_output(curve, backend, emit_texture));
    });
    JobState::Pending(receiver)
}

#[cfg(not(feature = "parallel"))]
fn spawn_build(curve: HilbertCurve, backend: LutBackend, emit_texture: bool) -> JobState {
    JobState::Ready(build_output(curve, backend, emit_texture))
}
