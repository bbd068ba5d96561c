//! Single-shot scanning of still images

use image::{DynamicImage, Rgba, RgbaImage, imageops};
use std::path::Path;
use tracing::debug;

use crate::{
    core::{error::ImageScanError, types::DetectionResult},
    qr::QrDecoder,
};

/// Wider images are scaled down to this width before decoding
pub const MAX_SCAN_WIDTH: u32 = 400;

/// Downscale and flatten an image onto white
pub fn prepare_still_image(image: &DynamicImage) -> RgbaImage {
    let (mut width, mut height) = (image.width(), image.height());
    if width > MAX_SCAN_WIDTH {
        height = ((height as f64) * (MAX_SCAN_WIDTH as f64 / width as f64)).round().max(1.0) as u32;
        width = MAX_SCAN_WIDTH;
    }

    let scaled = image.resize_exact(width, height, imageops::FilterType::Triangle);
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, &scaled.to_rgba8(), 0, 0);
    canvas
}

/// Run one decode attempt on an in-memory image
pub fn scan_still_image<D: QrDecoder>(image: &DynamicImage, decoder: &mut D) -> DetectionResult {
    let prepared = prepare_still_image(image);
    let (width, height) = prepared.dimensions();

    match decoder.decode(prepared.as_raw(), width, height) {
        Some(text) => DetectionResult::from_decoded(text),
        None => {
            debug!("No QR code found in {}x{} image", width, height);
            DetectionResult::NoDetection
        }
    }
}

/// Load an image file and run one decode attempt on it
pub fn scan_image<D: QrDecoder>(
    path: &Path,
    decoder: &mut D,
) -> Result<DetectionResult, ImageScanError> {
    let image = image::open(path)?;
    Ok(scan_still_image(&image, decoder))
}
