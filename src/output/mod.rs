//! PNG encoding, file output and generation reports

use crate::error::Result;
use crate::qr::EcLevel;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Encode an RGB image as PNG bytes
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

/// Write encoded PNG bytes to `path`, replacing any existing file
pub fn write_png(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Wrote QR image");
    Ok(())
}

/// Summary of a completed generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Where the PNG was written
    pub path: PathBuf,
    /// Version asked for
    pub requested_version: u8,
    /// Version actually used after fitting
    pub version: u8,
    /// Error correction level
    pub ec_level: EcLevel,
    /// Modules along one side, quiet zone excluded
    pub modules: usize,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Payload length in bytes
    pub payload_bytes: usize,
    /// Size of the written PNG
    pub png_bytes: usize,
}

/// Combined structured and human-readable representation of a report
#[derive(Debug, Clone)]
pub struct RenderedReport {
    /// Structured JSON representation
    pub json: Value,
    /// Human-readable lines for terminal presentation
    pub human: Vec<String>,
}

impl RenderedReport {
    /// Pretty-printed JSON form
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.json)?)
    }
}

/// Render a report into both JSON and human-readable forms.
pub fn render_report(report: &GenerationReport) -> Result<RenderedReport> {
    let json = serde_json::to_value(report)?;
    let human = vec![format!("Saved as {}", report.path.display())];
    Ok(RenderedReport { json, human })
}
