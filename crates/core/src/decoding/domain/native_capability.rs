use thiserror::Error;

use crate::decoding::domain::symbology::Symbology;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("failed to enumerate supported formats: {0}")]
    Probe(String),
    #[error("failed to construct detector: {0}")]
    Construct(String),
    #[error("detection call failed: {0}")]
    Detect(String),
}

/// One barcode candidate reported by a host detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedBarcode {
    pub raw_value: String,
    pub display_value: String,
    pub symbology: Symbology,
}

impl DetectedBarcode {
    /// The raw value, or the display value when the raw value is empty.
    pub fn payload_text(&self) -> Option<&str> {
        [self.raw_value.as_str(), self.display_value.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

/// A host-provided barcode detection capability.
///
/// Injected by the platform adapter at start-up. Probing happens once per
/// session, never per tick.
pub trait BarcodeCapability: Send + Sync {
    fn supported_symbologies(&self) -> Result<Vec<Symbology>, CapabilityError>;

    fn create_detector(
        &self,
        symbologies: &[Symbology],
    ) -> Result<Box<dyn PlatformBarcodeDetector>, CapabilityError>;
}

/// A detector instance bound to a fixed set of symbologies.
pub trait PlatformBarcodeDetector: Send {
    /// Candidates in the order the platform reports them.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedBarcode>, CapabilityError>;
}
