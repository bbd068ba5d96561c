//! Labeled PNG export of a rendered code

use ab_glyph::{Font, FontRef, GlyphId, PxScale, ScaleFont, point};
use image::{GrayImage, Luma, imageops};
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::core::error::ExportError;

const CANVAS_WIDTH: u32 = 400;
const CANVAS_HEIGHT: u32 = 460;
const CODE_SIZE: u32 = 320;
const CODE_TOP: u32 = 60;
const LABEL_SIZE: f32 = 20.0;
const LABEL_BASELINE: f32 = 30.0;

static LABEL_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// File name for an exported code, `wifi-qr-<ssid>.png`
pub fn export_file_name(ssid: &str) -> String {
    let label = ssid.trim();
    let label = if label.is_empty() { "network" } else { label };
    let safe: String = label
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    format!("wifi-qr-{}.png", safe)
}

/// Lay the code out on the export canvas
///
/// The network name is drawn centered in the header band and the code is
/// scaled to 320x320 below it.
pub fn compose_export_canvas(code: &GrayImage, label: &str) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Luma([255]));
    draw_label(&mut canvas, label.trim());

    let scaled = imageops::resize(code, CODE_SIZE, CODE_SIZE, imageops::FilterType::Nearest);
    let left = (CANVAS_WIDTH - CODE_SIZE) / 2;
    imageops::overlay(&mut canvas, &scaled, left as i64, CODE_TOP as i64);
    canvas
}

/// Draw one line of text centered on the header baseline
///
/// Ink is clipped to the header band; names wider than the canvas lose
/// both ends.
fn draw_label(canvas: &mut GrayImage, text: &str) {
    if text.is_empty() {
        return;
    }
    let font = match FontRef::try_from_slice(LABEL_FONT) {
        Ok(font) => font,
        Err(e) => {
            warn!("Label font unusable: {}", e);
            return;
        }
    };
    let scale = PxScale::from(LABEL_SIZE);
    let scaled = font.as_scaled(scale);

    let mut caret = 0.0f32;
    let mut previous: Option<GlyphId> = None;
    let mut glyphs = Vec::with_capacity(text.len());
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push((id, caret));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    let left = (CANVAS_WIDTH as f32 - caret) / 2.0;
    for (id, offset) in glyphs {
        let glyph = id.with_scale_and_position(scale, point(left + offset, LABEL_BASELINE));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|x, y, coverage| {
            let px = bounds.min.x as i64 + x as i64;
            let py = bounds.min.y as i64 + y as i64;
            if px < 0 || py < 0 || px >= CANVAS_WIDTH as i64 || py >= CODE_TOP as i64 {
                return;
            }
            let ink = (coverage.clamp(0.0, 1.0) * 255.0) as u8;
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            pixel.0[0] = pixel.0[0].min(255 - ink);
        });
    }
}

/// Write the code as `wifi-qr-<ssid>.png` into `dir`
///
/// The SSID is drawn above the code and also stored in the PNG `Title` text
/// chunk.
pub fn export_labeled_png(code: &GrayImage, ssid: &str, dir: &Path) -> Result<PathBuf, ExportError> {
    let canvas = compose_export_canvas(code, ssid);
    let path = dir.join(export_file_name(ssid));

    let writer = BufWriter::new(File::create(&path)?);
    let mut encoder = png::Encoder::new(writer, canvas.width(), canvas.height());
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.add_itxt_chunk("Title".to_string(), ssid.trim().to_string())?;

    let mut writer = encoder.write_header()?;
    writer.write_image_data(canvas.as_raw())?;
    writer.finish()?;

    info!("Exported QR code to {}", path.display());
    Ok(path)
}
