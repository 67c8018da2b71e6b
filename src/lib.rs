//! permaqr - generate a permanent, scannable QR code PNG for a URL
//!
//! The pipeline is split into pure stages so each can be exercised without
//! touching the filesystem:
//!
//! - **Encode**: payload to [`QrSymbol`] via the `qrcode` crate, with an
//!   optional upward version fit
//! - **Rasterize**: symbol to an RGB bitmap with a configurable box size,
//!   quiet zone and palette
//! - **PNG encode**: bitmap to bytes
//! - **Write**: bytes to disk, the only effectful step
//!
//! # Example
//!
//! ```no_run
//! use permaqr::QrOptions;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let report = permaqr::generate(
//!         "https://sheffmsg.fun",
//!         &QrOptions::default(),
//!         Path::new("my_permanent_qr.png"),
//!     )?;
//!     println!("Saved as {}", report.path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod qr;

pub use config::{LogRotation, LoggingOptions, PermaqrConfig, QrOptions};
pub use error::{Error, Result};
pub use output::{GenerationReport, RenderedReport, render_report};
pub use qr::{EcLevel, QrDecoder, QrEncoder, QrPayload, QrRenderer, QrSymbol};

use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Encode, render and write QR images with a fixed set of options
#[derive(Debug, Clone)]
pub struct QrGenerator {
    encoder: QrEncoder,
    renderer: QrRenderer,
    requested_version: u8,
    verify: bool,
}

/// An encoded symbol together with its rendered bitmap
#[derive(Debug, Clone)]
pub struct RenderedQr {
    /// The encoded module matrix
    pub symbol: QrSymbol,
    /// The rasterized image
    pub image: RgbImage,
}

impl QrGenerator {
    /// Build a generator, validating the options first
    pub fn new(options: &QrOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            encoder: options.encoder()?,
            renderer: options.renderer()?,
            requested_version: options.version,
            verify: false,
        })
    }

    /// Decode every rendered image before it is written
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Encode and rasterize without writing anything
    pub fn render(&self, payload: &QrPayload) -> Result<RenderedQr> {
        let symbol = self.encoder.encode(payload)?;
        tracing::debug!(
            version = symbol.version(),
            ec_level = %symbol.ec_level(),
            modules = symbol.width(),
            "Encoded QR symbol"
        );
        let image = self.renderer.rasterize(&symbol)?;
        Ok(RenderedQr { symbol, image })
    }

    /// Render `payload` and write it as a PNG to `path`, replacing any existing file
    pub fn generate(&self, payload: &QrPayload, path: &Path) -> Result<GenerationReport> {
        let RenderedQr { symbol, image } = self.render(payload)?;

        let image = if self.verify {
            let dynamic = DynamicImage::ImageRgb8(image);
            QrDecoder::new().verify(&dynamic, payload)?;
            tracing::debug!("Rendered image decodes back to the payload");
            dynamic.into_rgb8()
        } else {
            image
        };

        let png = output::encode_png(&image)?;
        output::write_png(path, &png)?;

        Ok(GenerationReport {
            path: path.to_path_buf(),
            requested_version: self.requested_version,
            version: symbol.version(),
            ec_level: symbol.ec_level(),
            modules: symbol.width(),
            width: image.width(),
            height: image.height(),
            payload_bytes: payload.len(),
            png_bytes: png.len(),
        })
    }
}

/// Generate a QR code PNG for `url` at `output` using `options`.
pub fn generate(url: &str, options: &QrOptions, output: &Path) -> Result<GenerationReport> {
    let payload = QrPayload::new(url)?;
    QrGenerator::new(options)?.generate(&payload, output)
}
