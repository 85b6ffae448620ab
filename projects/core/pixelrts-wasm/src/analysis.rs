//! Coarse complexity statistics for WASM modules.

use crate::opcodes::{category, OpcodeCategory};

/// Length of the WASM preamble (magic + version) excluded from analysis.
const HEADER_LEN: usize = 8;

/// Per-category byte counts over a module body.
///
/// Counting is byte-wise: immediates are classified as if they were opcodes, so the numbers are
/// a visual density estimate rather than a disassembly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComplexityReport {
    /// Bytes analyzed (module length minus the header).
    pub total: usize,
    /// Count per [`OpcodeCategory`], indexed by [`OpcodeCategory::index`].
    pub counts: [usize; 7],
}

impl ComplexityReport {
    /// Count for a single category.
    pub fn count(&self, category: OpcodeCategory) -> usize {
        self.counts[category.index()]
    }

    /// Share of analyzed bytes that are control-flow opcodes.
    pub fn branch_density(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(OpcodeCategory::ControlFlow) as f64 / self.total as f64
    }

    /// Complexity score in `0..=100`, saturating once half the body is control flow.
    pub fn complexity_score(&self) -> f64 {
        (self.branch_density() * 200.0).min(100.0)
    }

    /// Iterates `(category, count)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (OpcodeCategory, usize)> + '_ {
        OpcodeCategory::all_values()
            .iter()
            .map(move |&category| (category, self.count(category)))
    }
}

/// Counts opcode categories in `data`, skipping the 8-byte header.
pub fn analyze_complexity(data: &[u8]) -> ComplexityReport {
    let body = data.get(HEADER_LEN..).unwrap_or(&[]);
    let mut report = ComplexityReport {
        total: body.len(),
        ..Default::default()
    };
    for &byte in body {
        report.counts[category(byte).index()] += 1;
    }
    report
}
