#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod color_8888;
#[cfg(feature = "std")]
pub mod cpu_detect;
pub mod hash;
