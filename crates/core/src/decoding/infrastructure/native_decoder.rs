use crate::decoding::domain::native_capability::PlatformBarcodeDetector;
use crate::decoding::domain::qr_decoder::{DecodeError, DecodedPayload, QrDecoder};
use crate::shared::frame::Frame;

/// Delegates to a host barcode detector bound to QR only.
///
/// When the platform reports several candidates only the first one counts.
pub struct NativeDecoder {
    detector: Box<dyn PlatformBarcodeDetector>,
}

impl NativeDecoder {
    pub fn new(detector: Box<dyn PlatformBarcodeDetector>) -> Self {
        Self { detector }
    }
}

impl QrDecoder for NativeDecoder {
    fn detect(&mut self, frame: &Frame) -> Result<Option<DecodedPayload>, DecodeError> {
        let candidates = self.detector.detect(frame)?;
        Ok(candidates
            .first()
            .and_then(|c| c.payload_text())
            .map(DecodedPayload::new))
    }

    fn name(&self) -> &str {
        "native"
    }
}
