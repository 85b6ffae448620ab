//! Per-section compression bookkeeping for multi-section payloads.

use crate::adaptive::CompressionOutcome;
use crate::content::ContentType;
use crate::error::CompressResult;
use crate::level::{CompressionAlgorithm, CompressionLevel};
use serde::{Deserialize, Serialize};

/// Compression record for one named section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedSection {
    /// Section name.
    pub name: String,
    /// Offset of the section in the uncompressed payload.
    pub offset: usize,
    /// Uncompressed size.
    pub original_size: usize,
    /// Compressed size.
    pub compressed_size: usize,
    /// Algorithm used for this section.
    pub algorithm: CompressionAlgorithm,
    /// Effective level.
    pub level: CompressionLevel,
    /// Detected content type.
    pub content_type: ContentType,
}

/// Totals across a [`SectionTable`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionSummary {
    /// Number of sections.
    pub section_count: usize,
    /// Sum of uncompressed sizes.
    pub original_size: usize,
    /// Sum of compressed sizes.
    pub compressed_size: usize,
    /// `compressed_size / original_size`, `0.0` when empty.
    pub ratio: f64,
}

/// Ordered table of [`CompressedSection`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionTable {
    sections: Vec<CompressedSection>,
}

impl SectionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the compression result of section `name` starting at `offset`.
    ///
    /// A section with the same name is replaced.
    pub fn add_section(
        &mut self,
        name: impl Into<String>,
        offset: usize,
        outcome: &CompressionOutcome,
    ) {
        let section = CompressedSection {
            name: name.into(),
            offset,
            original_size: outcome.original_size,
            compressed_size: outcome.compressed_size,
            algorithm: outcome.algorithm,
            level: outcome.level,
            content_type: outcome.content_type,
        };
        match self.sections.iter_mut().find(|s| s.name == section.name) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    /// Looks up a section by name.
    pub fn section(&self, name: &str) -> Option<&CompressedSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// All sections in insertion order.
    pub fn sections(&self) -> &[CompressedSection] {
        &self.sections
    }

    /// Aggregate sizes.
    pub fn summary(&self) -> SectionSummary {
        let original_size = self.sections.iter().map(|s| s.original_size).sum();
        let compressed_size = self.sections.iter().map(|s| s.compressed_size).sum();
        let ratio = if original_size == 0 {
            0.0
        } else {
            compressed_size as f64 / original_size as f64
        };
        SectionSummary {
            section_count: self.sections.len(),
            original_size,
            compressed_size,
            ratio,
        }
    }

    /// Serializes the table as a JSON array.
    pub fn to_json(&self) -> CompressResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a table produced by [`Self::to_json`].
    pub fn from_json(json: &str) -> CompressResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
