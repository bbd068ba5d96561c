//! QR generation from entered credentials

use image::GrayImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{
    backend::Clipboard,
    core::{
        codec::{Payload, PayloadCodec},
        error::{GenerateError, GenerateResult},
        types::WifiCredentials,
    },
    qr::{QrRenderer, RenderOptions, export_labeled_png},
};

/// Last successfully generated code
#[derive(Debug, Clone)]
pub struct GeneratedCode {
    pub credentials: WifiCredentials,
    pub payload: Payload,
    pub image: GrayImage,
}

/// Turns entered credentials into a rendered code and keeps it for export
/// and copy
pub struct GenerationController<R: QrRenderer, C: Clipboard> {
    renderer: R,
    clipboard: C,
    options: RenderOptions,
    last: Option<GeneratedCode>,
}

impl<R: QrRenderer, C: Clipboard> GenerationController<R, C> {
    pub fn new(renderer: R, clipboard: C) -> Self {
        Self {
            renderer,
            clipboard,
            options: RenderOptions::default(),
            last: None,
        }
    }

    /// Validate, encode and render
    ///
    /// Surrounding whitespace is stripped from the SSID. On failure the
    /// previously generated code is kept.
    pub fn generate(&mut self, mut credentials: WifiCredentials) -> GenerateResult<&GeneratedCode> {
        credentials.ssid = credentials.ssid.trim().to_string();
        credentials.validate()?;

        let payload = PayloadCodec::encode(&credentials);
        let image = self.renderer.render(payload.as_str(), &self.options)?;
        debug!(
            "Rendered {}x{} code for {}",
            image.width(),
            image.height(),
            credentials.ssid
        );

        Ok(&*self.last.insert(GeneratedCode {
            credentials,
            payload,
            image,
        }))
    }

    pub fn last(&self) -> Option<&GeneratedCode> {
        self.last.as_ref()
    }

    /// Write the last code as a labeled PNG into `dir`
    pub fn export_png(&self, dir: &Path) -> GenerateResult<PathBuf> {
        let code = self.last.as_ref().ok_or(GenerateError::NothingGenerated)?;
        let path = export_labeled_png(&code.image, &code.credentials.ssid, dir)?;
        Ok(path)
    }

    /// Copy the last payload text to the clipboard
    pub async fn copy_payload(&self) -> GenerateResult<()> {
        let code = self.last.as_ref().ok_or(GenerateError::NothingGenerated)?;
        self.clipboard.write_text(code.payload.as_str()).await?;
        info!("Payload copied to clipboard");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::MockClipboard,
        core::{
            error::{ClipboardError, ValidationError},
            types::AuthType,
        },
        qr::QrCodeRenderer,
    };
    use pretty_assertions::assert_eq;

    fn controller(clipboard: MockClipboard) -> GenerationController<QrCodeRenderer, MockClipboard> {
        GenerationController::new(QrCodeRenderer, clipboard)
    }

    #[test]
    fn test_generate_trims_ssid_and_renders() {
        let mut controller = controller(MockClipboard::new());

        let code = controller
            .generate(WifiCredentials::new("  Home Net ", "s3cr3t!", AuthType::wpa(), true))
            .unwrap();
        assert_eq!(code.credentials.ssid, "Home Net");
        assert_eq!(
            code.payload.as_str(),
            "WIFI:T:WPA;S:Home Net;P:s3cr3t!;H:true;"
        );
        assert_eq!(code.image.dimensions(), (280, 280));
        assert!(controller.last().is_some());
    }

    #[test]
    fn test_generate_open_network() {
        let mut controller = controller(MockClipboard::new());
        let code = controller
            .generate(WifiCredentials::open("Guest", false))
            .unwrap();
        assert_eq!(code.payload.as_str(), "WIFI:T:nopass;S:Guest;;");
    }

    #[test]
    fn test_validation_failure_keeps_previous_code() {
        let mut controller = controller(MockClipboard::new());
        controller
            .generate(WifiCredentials::open("Guest", false))
            .unwrap();

        let result = controller.generate(WifiCredentials::new("   ", "pw", AuthType::wpa(), false));
        assert!(matches!(
            result,
            Err(GenerateError::Validation(ValidationError::EmptySsid))
        ));

        let result = controller.generate(WifiCredentials::new("Home", "", AuthType::wep(), false));
        assert!(matches!(
            result,
            Err(GenerateError::Validation(ValidationError::MissingPassword))
        ));

        assert_eq!(controller.last().unwrap().credentials.ssid, "Guest");
    }

    #[test]
    fn test_export_requires_generated_code() {
        let controller = controller(MockClipboard::new());
        let dir = tempfile::tempdir().unwrap();

        let result = controller.export_png(dir.path());
        assert!(matches!(result, Err(GenerateError::NothingGenerated)));
        assert_eq!(
            GenerateError::NothingGenerated.to_string(),
            "Please generate a QR first"
        );
    }

    #[test]
    fn test_export_writes_labeled_png() {
        let mut controller = controller(MockClipboard::new());
        let dir = tempfile::tempdir().unwrap();
        controller
            .generate(WifiCredentials::new("Lab", "k", AuthType::wep(), false))
            .unwrap();

        let path = controller.export_png(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("wifi-qr-Lab.png"));

        let exported = image::open(&path).unwrap();
        assert_eq!((exported.width(), exported.height()), (400, 460));
    }

    #[tokio::test]
    async fn test_copy_payload() {
        let clipboard = MockClipboard::new();
        let mut controller = controller(clipboard.clone());

        assert!(matches!(
            controller.copy_payload().await,
            Err(GenerateError::NothingGenerated)
        ));

        controller
            .generate(WifiCredentials::new("Home", "pw", AuthType::wpa(), false))
            .unwrap();
        controller.copy_payload().await.unwrap();
        assert_eq!(
            clipboard.writes().await,
            vec!["WIFI:T:WPA;S:Home;P:pw;;".to_string()]
        );
    }

    #[tokio::test]
    async fn test_copy_payload_failure() {
        let mut controller = controller(MockClipboard::failing());
        controller
            .generate(WifiCredentials::open("Guest", false))
            .unwrap();

        let result = controller.copy_payload().await;
        assert!(matches!(
            result,
            Err(GenerateError::Clipboard(ClipboardError::WriteFailed(_)))
        ));
    }
}
