//! QR image rendering

use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};

use crate::core::error::{RenderError, RenderResult};

const LIGHT: Luma<u8> = Luma([255]);
const DARK: Luma<u8> = Luma([0]);

/// QR error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCorrection {
    Low,
    Medium,
    Quartile,
    High,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::Low => EcLevel::L,
            ErrorCorrection::Medium => EcLevel::M,
            ErrorCorrection::Quartile => EcLevel::Q,
            ErrorCorrection::High => EcLevel::H,
        }
    }
}

/// Output parameters for a rendered code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Edge length of the square output image in pixels
    pub width: u32,
    /// Quiet zone in modules
    pub margin: u32,
    pub error_correction: ErrorCorrection,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 280,
            margin: 1,
            error_correction: ErrorCorrection::Medium,
        }
    }
}

/// Turns text into a QR code image
pub trait QrRenderer {
    fn render(&self, text: &str, options: &RenderOptions) -> RenderResult<GrayImage>;
}

/// Renderer built on the `qrcode` crate
///
/// Modules are scaled by the largest whole factor that fits `width`; the
/// code is centered on a white square of at least `width` pixels.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrCodeRenderer;

impl QrRenderer for QrCodeRenderer {
    fn render(&self, text: &str, options: &RenderOptions) -> RenderResult<GrayImage> {
        let code =
            QrCode::with_error_correction_level(text.as_bytes(), options.error_correction.into())
                .map_err(|e| RenderError::Encode(e.to_string()))?;

        let modules = code.width() as u32;
        let total = modules + 2 * options.margin;
        let scale = (options.width / total).max(1);
        let size = (total * scale).max(options.width);
        let origin = (size - total * scale) / 2 + options.margin * scale;

        let mut image = GrayImage::from_pixel(size, size, LIGHT);
        for (idx, color) in code.to_colors().into_iter().enumerate() {
            if color != Color::Dark {
                continue;
            }
            let x0 = origin + (idx as u32 % modules) * scale;
            let y0 = origin + (idx as u32 / modules) * scale;
            for y in y0..y0 + scale {
                for x in x0..x0 + scale {
                    image.put_pixel(x, y, DARK);
                }
            }
        }

        Ok(image)
    }
}
