//! QR code collaborators: rendering, pixel decoding, export and still images

pub mod decoder;
pub mod export;
pub mod image_scan;
pub mod renderer;

pub use decoder::{QrDecoder, RqrrDecoder};
pub use export::{export_file_name, export_labeled_png};
pub use image_scan::{scan_image, scan_still_image};
pub use renderer::{ErrorCorrection, QrCodeRenderer, QrRenderer, RenderOptions};
