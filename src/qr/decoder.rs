//! QR code decoder using rqrr

use crate::error::{Error, Result};
use crate::qr::QrPayload;
use image::{DynamicImage, GrayImage};

/// QR code decoder, used to check rendered images read back correctly
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDecoder;

impl QrDecoder {
    /// Create a new QR decoder with default settings
    pub fn new() -> Self {
        Self
    }

    /// Decode a QR code from an image
    pub fn decode(&self, img: &DynamicImage) -> Result<QrPayload> {
        self.decode_gray(&img.to_luma8())
    }

    /// Decode a QR code from a grayscale image
    pub fn decode_gray(&self, img: &GrayImage) -> Result<QrPayload> {
        let mut prepared = rqrr::PreparedImage::prepare(img.clone());
        let grids = prepared.detect_grids();

        let grid = grids.first().ok_or(Error::NoQrCodeFound)?;

        match grid.decode() {
            Ok((meta, content)) => {
                tracing::debug!(
                    "Decoded QR: version={:?}, ecc_level={:?}, length={}",
                    meta.version,
                    meta.ecc_level,
                    content.len()
                );

                Ok(QrPayload::from_bytes(content.into_bytes()))
            }
            Err(e) => Err(Error::QrDecode(format!("Decode failed: {:?}", e))),
        }
    }

    /// Decode every QR code found in an image, skipping grids that fail to decode
    pub fn decode_all(&self, img: &DynamicImage) -> Result<Vec<QrPayload>> {
        let mut prepared = rqrr::PreparedImage::prepare(img.to_luma8());
        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Err(Error::NoQrCodeFound);
        }

        let detected = grids.len();
        let payloads: Vec<QrPayload> = grids
            .into_iter()
            .filter_map(|grid| match grid.decode() {
                Ok((_, content)) => Some(QrPayload::from_bytes(content.into_bytes())),
                Err(e) => {
                    tracing::warn!(error = ?e, "Skipping undecodable QR grid");
                    None
                }
            })
            .collect();

        if payloads.is_empty() {
            return Err(Error::QrDecode(format!(
                "none of {detected} detected grids could be decoded"
            )));
        }
        Ok(payloads)
    }

    /// Check `img` holds exactly one QR code and that it carries `expected`
    pub fn verify(&self, img: &DynamicImage, expected: &QrPayload) -> Result<()> {
        let mut payloads = self.decode_all(img)?;
        if payloads.len() != 1 {
            return Err(Error::Verification(format!(
                "expected a single QR code, found {}",
                payloads.len()
            )));
        }

        let decoded = payloads.remove(0);
        if decoded.as_bytes() != expected.as_bytes() {
            return Err(Error::Verification(format!(
                "decoded {:?}, expected {:?}",
                String::from_utf8_lossy(decoded.as_bytes()),
                String::from_utf8_lossy(expected.as_bytes())
            )));
        }
        Ok(())
    }
}
