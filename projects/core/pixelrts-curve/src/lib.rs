#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod generator;
pub mod hilbert;
pub mod lut;
pub mod texture;

pub use backend::LutBackend;
pub use error::{CurveError, CurveResult};
pub use generator::{LutGenerator, LutJob, LutOutput};
pub use hilbert::{Coord, HilbertCurve};
pub use lut::HilbertLut;
pub use texture::LutTexture;
