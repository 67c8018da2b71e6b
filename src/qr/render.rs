//! Rasterize QR symbols into RGB bitmaps

use crate::error::{Error, Result};
use crate::qr::QrSymbol;
use image::{Rgb, RgbImage};

/// Largest image side, in pixels, the renderer will allocate
pub const MAX_IMAGE_SIDE: u32 = 10_000;

/// Renders a [`QrSymbol`] with a fixed box size, quiet zone and palette
#[derive(Debug, Clone)]
pub struct QrRenderer {
    box_size: u32,
    border: u32,
    fill: Rgb<u8>,
    back: Rgb<u8>,
}

impl QrRenderer {
    /// Create a renderer; `box_size` is pixels per module, `border` is the
    /// quiet zone width in modules on each side
    pub fn new(box_size: u32, border: u32, fill: Rgb<u8>, back: Rgb<u8>) -> Result<Self> {
        if box_size == 0 {
            return Err(Error::Config("box size must be at least 1 pixel".to_string()));
        }
        if fill == back {
            tracing::warn!(color = ?fill.0, "Fill and background colours are identical");
        }
        Ok(Self {
            box_size,
            border,
            fill,
            back,
        })
    }

    /// Black on white, the classic palette
    pub fn monochrome(box_size: u32, border: u32) -> Result<Self> {
        Self::new(box_size, border, Rgb([0, 0, 0]), Rgb([255, 255, 255]))
    }

    /// Side length in pixels of the image for a symbol `modules` wide
    pub fn image_side(&self, modules: usize) -> Result<u32> {
        u32::try_from(modules)
            .ok()
            .and_then(|m| m.checked_add(self.border.checked_mul(2)?))
            .and_then(|m| m.checked_mul(self.box_size))
            .filter(|side| *side <= MAX_IMAGE_SIDE)
            .ok_or_else(|| {
                Error::Config(format!(
                    "image for {modules} modules with border {} and box size {} exceeds {MAX_IMAGE_SIDE} pixels per side",
                    self.border, self.box_size
                ))
            })
    }

    /// Rasterize a symbol into an RGB image
    pub fn rasterize(&self, symbol: &QrSymbol) -> Result<RgbImage> {
        let side = self.image_side(symbol.width())?;
        let mut img = RgbImage::from_pixel(side, side, self.back);
        let offset = self.border * self.box_size;

        for y in 0..symbol.width() {
            for x in 0..symbol.width() {
                if !symbol.is_dark(x, y) {
                    continue;
                }
                let left = offset + x as u32 * self.box_size;
                let top = offset + y as u32 * self.box_size;
                for dy in 0..self.box_size {
                    for dx in 0..self.box_size {
                        img.put_pixel(left + dx, top + dy, self.fill);
                    }
                }
            }
        }

        tracing::debug!(
            side,
            modules = symbol.width(),
            box_size = self.box_size,
            border = self.border,
            "Rasterized QR symbol"
        );
        Ok(img)
    }
}

/// Parse a CSS colour string (`black`, `#1e90ff`, `rgb(0,0,0)`, ...) into RGB.
/// Alpha is discarded.
pub fn parse_color(value: &str) -> Result<Rgb<u8>> {
    let color = csscolorparser::parse(value)
        .map_err(|e| Error::Config(format!("Invalid colour '{value}': {e}")))?;
    let [r, g, b, _] = color.to_rgba8();
    Ok(Rgb([r, g, b]))
}
