//! QR pixel decoding

use tracing::trace;

/// Fixed-point luma coefficients: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Finds and decodes a QR code in an RGBA buffer
///
/// `None` means no readable code in this buffer and is not an error.
pub trait QrDecoder: Send {
    fn decode(&mut self, pixels: &[u8], width: u32, height: u32) -> Option<String>;
}

/// Decoder built on the `rqrr` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    pub fn new() -> Self {
        Self
    }
}

/// Luma of one RGBA pixel, flattened onto white
fn luma(px: &[u8]) -> u8 {
    let y = (COEF_R * px[0] as u32 + COEF_G * px[1] as u32 + COEF_B * px[2] as u32) >> 8;
    let alpha = px[3] as u32;
    ((y * alpha + 255 * (255 - alpha)) / 255) as u8
}

impl QrDecoder for RqrrDecoder {
    fn decode(&mut self, pixels: &[u8], width: u32, height: u32) -> Option<String> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 || pixels.len() < w * h * 4 {
            return None;
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w, h, |x, y| {
            let offset = (y * w + x) * 4;
            luma(&pixels[offset..offset + 4])
        });

        let grids = prepared.detect_grids();
        trace!("Found {} candidate grids", grids.len());
        grids
            .into_iter()
            .find_map(|grid| grid.decode().ok().map(|(_, content)| content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::renderer::{QrCodeRenderer, QrRenderer, RenderOptions};
    use image::{DynamicImage, GrayImage};

    fn to_rgba(image: GrayImage) -> (Vec<u8>, u32, u32) {
        let rgba = DynamicImage::ImageLuma8(image).to_rgba8();
        let (w, h) = rgba.dimensions();
        (rgba.into_raw(), w, h)
    }

    #[test]
    fn test_luma_flattens_transparency() {
        assert_eq!(luma(&[0, 0, 0, 255]), 0);
        assert_eq!(luma(&[0, 0, 0, 0]), 255);
        assert!(luma(&[255, 255, 255, 255]) >= 254);
    }

    #[test]
    fn test_decode_rendered_code() {
        let payload = "WIFI:T:WPA;S:Home Net;P:s3cr3t!;H:true;";
        let image = QrCodeRenderer
            .render(payload, &RenderOptions::default())
            .unwrap();
        let (pixels, w, h) = to_rgba(image);

        let mut decoder = RqrrDecoder::new();
        assert_eq!(decoder.decode(&pixels, w, h), Some(payload.to_string()));
    }

    #[test]
    fn test_decode_blank_frame() {
        let (pixels, w, h) = to_rgba(GrayImage::from_pixel(64, 64, image::Luma([255])));
        let mut decoder = RqrrDecoder::new();
        assert_eq!(decoder.decode(&pixels, w, h), None);
    }

    #[test]
    fn test_decode_short_buffer() {
        let mut decoder = RqrrDecoder::new();
        assert_eq!(decoder.decode(&[0; 12], 4, 4), None);
        assert_eq!(decoder.decode(&[], 0, 0), None);
    }
}
