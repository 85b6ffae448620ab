//! SHA-256 helpers for payload and segment hashes.
//!
//! Hashes are stored in container metadata as lowercase hex strings.

use alloc::string::String;
use core::fmt::Write;
use sha2::{Digest, Sha256};

/// Computes the SHA-256 of `data` as a lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        // Writing into a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Checks `data` against a hex-encoded SHA-256, ignoring case.
pub fn verify_sha256_hex(data: &[u8], expected: &str) -> bool {
    sha256_hex(data).eq_ignore_ascii_case(expected.trim())
}
