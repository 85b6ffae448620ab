//! Container metadata: the JSON document stored in the PNG annotation and the sidecar.
//!
//! Unknown fields are kept in [`UserMetadata::extra`] so that metadata written by newer tools
//! survives a read/write cycle.

use crate::error::{FormatError, PixelRtsResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;
use pixelrts_compression::{CompressionAlgorithm, CompressionLevel, ContentType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Format identifier written to every container.
pub const FORMAT_ID: &str = "PixelRTS-2.0";

/// Container format version.
pub const FORMAT_VERSION: u32 = 2;

/// PNG text keyword, and the prefix of the annotation text.
pub const ANNOTATION_KEYWORD: &str = "PixelRTS";

/// Top-level keys owned by the container; user metadata may not set them.
pub const RESERVED_KEYS: &[&str] = &[
    "format",
    "format_version",
    "grid_size",
    "encoding",
    "mode",
    "segments",
    "compression",
    "data_hash",
    "data_size",
    "original_data_b64",
];

/// How payload bytes are packed into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Four raw bytes per pixel.
    #[default]
    #[serde(alias = "dense")]
    Standard,
    /// Two WASM bytes per pixel with semantic colouring.
    Code,
}

impl EncodingMode {
    /// Payload bytes stored per pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            EncodingMode::Standard => 4,
            EncodingMode::Code => pixelrts_wasm::BYTES_PER_PIXEL,
        }
    }

    /// Pixel encoding recorded alongside the mode.
    pub const fn encoding_type(self) -> EncodingType {
        match self {
            EncodingMode::Standard => EncodingType::RgbaDense,
            EncodingMode::Code => EncodingType::RgbaCode,
        }
    }
}

/// Pixel encoding name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingType {
    /// Raw RGBA packing.
    #[serde(rename = "RGBA-dense")]
    RgbaDense,
    /// Semantic WASM packing.
    #[serde(rename = "RGBA-code")]
    RgbaCode,
}

/// `encoding` block of the metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingInfo {
    /// Pixel encoding.
    #[serde(rename = "type")]
    pub kind: EncodingType,
    /// Payload bytes per pixel.
    pub bytes_per_pixel: usize,
    /// Pixel ordering.
    #[serde(default = "default_mapping")]
    pub mapping: String,
}

fn default_mapping() -> String {
    "Hilbert space-filling curve".to_string()
}

impl EncodingInfo {
    /// Encoding block for `mode`.
    pub fn for_mode(mode: EncodingMode) -> Self {
        Self {
            kind: mode.encoding_type(),
            bytes_per_pixel: mode.bytes_per_pixel(),
            mapping: default_mapping(),
        }
    }
}

/// A named byte range of the decoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Start within the payload.
    pub offset: u64,
    /// Length in bytes.
    pub size: u64,
    /// Lowercase hex SHA-256 of the range.
    pub sha256: String,
}

/// `compression` block of the metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionInfo {
    /// Algorithm that produced the pixel stream.
    #[serde(rename = "type")]
    pub algorithm: CompressionAlgorithm,
    /// Level it ran at.
    pub level: CompressionLevel,
    /// Length before compression.
    pub original_size: u64,
    /// Length of the stream stored in the pixels.
    pub compressed_size: u64,
    /// Detected content type, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
}

/// Caller-supplied descriptive fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Payload kind, e.g. `kernel`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Human readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Version of the payload itself (not of the container format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_version: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Any other fields, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserMetadata {
    /// Sets the payload kind.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the payload version.
    pub fn content_version(mut self, version: impl Into<String>) -> Self {
        self.content_version = Some(version.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an extra field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Copy safe to embed in a container.
    ///
    /// An extra `version` key becomes [`Self::content_version`] (unless one is already set), and
    /// extra keys listed in [`RESERVED_KEYS`] are dropped.
    pub fn normalized(&self) -> Self {
        let mut user = self.clone();
        if let Some(version) = user.extra.remove("version") {
            if user.content_version.is_none() {
                user.content_version = Some(match version {
                    Value::String(version) => version,
                    other => other.to_string(),
                });
            }
        }
        user.extra.retain(|key, _| {
            let reserved = RESERVED_KEYS.contains(&key.as_str());
            if reserved {
                debug!("Dropping reserved metadata key `{key}`");
            }
            !reserved
        });
        user
    }
}

/// Everything a decoder needs to know about a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Format identifier, [`FORMAT_ID`].
    pub format: String,
    /// Format version, [`FORMAT_VERSION`].
    pub format_version: u32,
    /// Side length of the image.
    pub grid_size: u32,
    /// Pixel encoding.
    pub encoding: EncodingInfo,
    /// Packing mode.
    #[serde(default)]
    pub mode: EncodingMode,
    /// Named ranges of the decoded payload.
    #[serde(default)]
    pub segments: BTreeMap<String, Segment>,
    /// Present when the pixel stream is compressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<CompressionInfo>,
    /// SHA-256 of the uncompressed payload.
    pub data_hash: String,
    /// Length of the uncompressed payload.
    pub data_size: u64,
    /// Base64 copy of the pixel stream (code mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_data_b64: Option<String>,
    /// Caller-supplied fields.
    #[serde(flatten)]
    pub user: UserMetadata,
}

impl Metadata {
    /// Length of the byte stream stored in the pixels.
    pub fn stream_len(&self) -> u64 {
        self.compression
            .as_ref()
            .map_or(self.data_size, |compression| compression.compressed_size)
    }

    /// Decodes the embedded verbatim copy, if any.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::VerbatimCopy`] if the copy is not valid base64.
    pub fn verbatim_copy(&self) -> PixelRtsResult<Option<Vec<u8>>> {
        self.original_data_b64
            .as_deref()
            .map(|encoded| BASE64.decode(encoded))
            .transpose()
            .map_err(Into::into)
    }

    /// Stores `stream` as the verbatim copy.
    pub fn set_verbatim_copy(&mut self, stream: &[u8]) {
        self.original_data_b64 = Some(BASE64.encode(stream));
    }

    /// Annotation text: [`ANNOTATION_KEYWORD`] followed by compact JSON.
    pub fn to_annotation(&self) -> PixelRtsResult<String> {
        Ok(format!("{ANNOTATION_KEYWORD}{}", serde_json::to_string(self)?))
    }

    /// Parses annotation text into raw JSON.
    ///
    /// # Errors
    ///
    /// [`FormatError::MissingMagic`] if the text lacks the prefix, or
    /// [`FormatError::Metadata`] for malformed JSON.
    pub fn parse_annotation(text: &str) -> PixelRtsResult<Value> {
        let json = text
            .strip_prefix(ANNOTATION_KEYWORD)
            .ok_or(FormatError::MissingMagic)?;
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON, as written to sidecars.
    pub fn to_json_pretty(&self) -> PixelRtsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a metadata document.
    ///
    /// # Errors
    ///
    /// [`FormatError::Metadata`] for malformed JSON, [`FormatError::UnsupportedVersion`] for
    /// documents written by a newer format.
    pub fn from_value(value: Value) -> PixelRtsResult<Self> {
        let metadata: Metadata = serde_json::from_value(value)?;
        if metadata.format_version > FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion(metadata.format_version).into());
        }
        Ok(metadata)
    }

    /// Combines the embedded annotation with a sidecar document.
    ///
    /// Sidecar fields win, except `original_data_b64`: the embedded copy, when present, is
    /// always kept because it was written together with the pixels.
    pub fn merge(embedded: Option<Value>, sidecar: Option<Value>) -> PixelRtsResult<Option<Self>> {
        let merged = match (embedded, sidecar) {
            (None, None) => return Ok(None),
            (Some(only), None) | (None, Some(only)) => only,
            (Some(Value::Object(mut embedded)), Some(Value::Object(sidecar))) => {
                let verbatim = embedded.remove("original_data_b64");
                for (key, value) in sidecar {
                    embedded.insert(key, value);
                }
                if let Some(verbatim) = verbatim {
                    embedded.insert("original_data_b64".to_string(), verbatim);
                }
                Value::Object(embedded)
            }
            (Some(_), Some(sidecar)) => sidecar,
        };
        Self::from_value(merged).map(Some)
    }
}
