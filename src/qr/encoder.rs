//! QR code encoder

use crate::error::{Error, Result};
use crate::qr::{EcLevel, MAX_VERSION, MIN_VERSION, QrPayload};
use qrcode::types::QrError;
use qrcode::{Color, QrCode, Version};

/// An encoded QR symbol: a square matrix of dark/light modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSymbol {
    version: u8,
    ec_level: EcLevel,
    width: usize,
    modules: Vec<bool>,
}

impl QrSymbol {
    fn from_code(code: &QrCode, version: u8, ec_level: EcLevel) -> Self {
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Self {
            version,
            ec_level,
            width: code.width(),
            modules,
        }
    }

    /// Version actually used for this symbol
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Error correction level of this symbol
    pub fn ec_level(&self) -> EcLevel {
        self.ec_level
    }

    /// Modules along one side (quiet zone excluded)
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at column `x`, row `y` is dark
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// Number of dark modules
    pub fn dark_modules(&self) -> usize {
        self.modules.iter().filter(|dark| **dark).count()
    }
}

/// QR code encoder
///
/// With `fit` enabled the configured version is a lower bound: the encoder
/// steps upward until the payload fits at the configured error correction
/// level. With `fit` disabled only the configured version is tried.
#[derive(Debug, Clone)]
pub struct QrEncoder {
    version: u8,
    ec_level: EcLevel,
    fit: bool,
}

impl QrEncoder {
    /// Create a new encoder, validating the version range
    pub fn new(version: u8, ec_level: EcLevel, fit: bool) -> Result<Self> {
        if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
            return Err(Error::Config(format!(
                "QR version {version} out of range {MIN_VERSION}..={MAX_VERSION}"
            )));
        }
        Ok(Self {
            version,
            ec_level,
            fit,
        })
    }

    /// Encode a payload into a QR symbol
    pub fn encode(&self, payload: &QrPayload) -> Result<QrSymbol> {
        if payload.is_empty() {
            return Err(Error::InvalidPayload("payload must not be empty".to_string()));
        }

        let last = if self.fit { MAX_VERSION } else { self.version };
        for version in self.version..=last {
            match QrCode::with_version(
                payload.as_bytes(),
                Version::Normal(i16::from(version)),
                self.ec_level.to_qrcode(),
            ) {
                Ok(code) => {
                    if version != self.version {
                        tracing::debug!(
                            requested = self.version,
                            fitted = version,
                            "Upgraded QR version to fit payload"
                        );
                    }
                    return Ok(QrSymbol::from_code(&code, version, self.ec_level));
                }
                Err(QrError::DataTooLong) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Encoding(format!(
            "{} byte payload exceeds the capacity of version {} at error correction level {}",
            payload.len(),
            last,
            self.ec_level
        )))
    }

    /// Encode a string into a QR symbol
    pub fn encode_string(&self, data: &str) -> Result<QrSymbol> {
        self.encode(&QrPayload::new(data)?)
    }
}
