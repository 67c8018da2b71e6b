//! QR code encoding, rasterization and decoding
//!
//! Encoding turns a payload into a [`QrSymbol`] (a square module matrix),
//! rendering turns a symbol into an RGB bitmap, and decoding reads a bitmap
//! back for verification. None of these touch the filesystem.

mod decoder;
mod encoder;
mod render;

pub use decoder::QrDecoder;
pub use encoder::{QrEncoder, QrSymbol};
pub use render::{MAX_IMAGE_SIDE, QrRenderer, parse_color};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest QR version
pub const MIN_VERSION: u8 = 1;
/// Largest QR version
pub const MAX_VERSION: u8 = 40;

/// Module count along one side of a symbol of the given version.
pub fn modules_for_version(version: u8) -> u32 {
    17 + 4 * u32::from(version)
}

/// A QR code payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    /// The raw data
    pub data: Vec<u8>,
    /// String representation if valid UTF-8
    pub text: Option<String>,
}

impl QrPayload {
    /// Create a payload for encoding, rejecting empty input
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::InvalidPayload("payload must not be empty".to_string()));
        }
        Ok(Self::from_string(text))
    }

    /// Create a new QR payload from raw bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let text = String::from_utf8(data.clone()).ok();
        Self { data, text }
    }

    /// Create a new QR payload from a string
    pub fn from_string(s: String) -> Self {
        Self {
            data: s.as_bytes().to_vec(),
            text: Some(s),
        }
    }

    /// Get the payload as a string, if valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload holds no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EcLevel {
    /// About 7% of codewords recoverable
    L,
    /// About 15% of codewords recoverable
    M,
    /// About 25% of codewords recoverable
    Q,
    /// About 30% of codewords recoverable
    H,
}

impl EcLevel {
    /// Parse a level identifier (case-insensitive letter or name)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Some(Self::L),
            "m" | "medium" => Some(Self::M),
            "q" | "quartile" => Some(Self::Q),
            "h" | "high" => Some(Self::H),
            _ => None,
        }
    }

    /// Canonical single-letter form
    pub fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        }
    }

    pub(crate) fn to_qrcode(self) -> qrcode::EcLevel {
        match self {
            Self::L => qrcode::EcLevel::L,
            Self::M => qrcode::EcLevel::M,
            Self::Q => qrcode::EcLevel::Q,
            Self::H => qrcode::EcLevel::H,
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EcLevel {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| {
            format!("Unsupported error correction level '{value}', expected L, M, Q or H")
        })
    }
}

impl TryFrom<String> for EcLevel {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EcLevel> for String {
    fn from(level: EcLevel) -> Self {
        level.as_str().to_string()
    }
}
