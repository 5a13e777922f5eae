use crate::decoding::domain::native_capability::{BarcodeCapability, PlatformBarcodeDetector};
use crate::decoding::domain::qr_decoder::QrDecoder;
use crate::decoding::domain::symbology::REQUIRED_SYMBOLOGY;
use crate::shared::scan_config::ScanConfig;

use super::native_decoder::NativeDecoder;
use super::software_loader::{LoadError, SoftwareDecoderLoader};

/// Which decoder variant a session runs with. Fixed for the session's
/// lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderChoice {
    Native,
    Software,
}

impl std::fmt::Display for DecoderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecoderChoice::Native => write!(f, "native"),
            DecoderChoice::Software => write!(f, "software"),
        }
    }
}

pub struct SelectedDecoder {
    pub choice: DecoderChoice,
    pub decoder: Box<dyn QrDecoder>,
}

/// Picks the decoder for a session.
///
/// Uses the host capability when it exists and supports QR; otherwise loads
/// the software decoder. Probe and construction failures on the host side
/// count as "no native capability". Only a failed software load is an
/// error.
pub fn select_decoder(
    capability: Option<&dyn BarcodeCapability>,
    loader: &dyn SoftwareDecoderLoader,
    config: &ScanConfig,
) -> Result<SelectedDecoder, LoadError> {
    if let Some(detector) = capability.and_then(native_detector) {
        log::info!("Using native barcode detector for {REQUIRED_SYMBOLOGY}");
        return Ok(SelectedDecoder {
            choice: DecoderChoice::Native,
            decoder: Box::new(NativeDecoder::new(detector)),
        });
    }

    let decoder = loader.load(config)?;
    log::info!(
        "Native {REQUIRED_SYMBOLOGY} detection unavailable, using {} decoder",
        decoder.name()
    );
    Ok(SelectedDecoder {
        choice: DecoderChoice::Software,
        decoder,
    })
}

fn native_detector(capability: &dyn BarcodeCapability) -> Option<Box<dyn PlatformBarcodeDetector>> {
    let supported = match capability.supported_symbologies() {
        Ok(s) => s,
        Err(e) => {
            log::debug!("Native capability probe failed: {e}");
            return None;
        }
    };
    if !supported.contains(&REQUIRED_SYMBOLOGY) {
        log::debug!("Native capability lacks {REQUIRED_SYMBOLOGY} (supports {supported:?})");
        return None;
    }
    match capability.create_detector(&[REQUIRED_SYMBOLOGY]) {
        Ok(detector) => Some(detector),
        Err(e) => {
            log::warn!("Native detector construction failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoding::domain::native_capability::{CapabilityError, DetectedBarcode};
    use crate::decoding::domain::qr_decoder::{DecodeError, DecodedPayload};
    use crate::decoding::domain::symbology::Symbology;
    use crate::shared::frame::Frame;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct FakeCapability {
        supported: Result<Vec<Symbology>, CapabilityError>,
        construct_fails: bool,
        requested: Mutex<Vec<Symbology>>,
    }

    impl FakeCapability {
        fn new(supported: Result<Vec<Symbology>, CapabilityError>) -> Self {
            Self {
                supported,
                construct_fails: false,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    struct EchoDetector;

    impl PlatformBarcodeDetector for EchoDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedBarcode>, CapabilityError> {
            Ok(vec![DetectedBarcode {
                raw_value: "ID-1".into(),
                display_value: String::new(),
                symbology: Symbology::QrCode,
            }])
        }
    }

    impl BarcodeCapability for FakeCapability {
        fn supported_symbologies(&self) -> Result<Vec<Symbology>, CapabilityError> {
            self.supported.clone()
        }

        fn create_detector(
            &self,
            symbologies: &[Symbology],
        ) -> Result<Box<dyn PlatformBarcodeDetector>, CapabilityError> {
            self.requested.lock().unwrap().extend_from_slice(symbologies);
            if self.construct_fails {
                return Err(CapabilityError::Construct("not allowed".into()));
            }
            Ok(Box::new(EchoDetector))
        }
    }

    struct StubDecoder;

    impl QrDecoder for StubDecoder {
        fn detect(&mut self, _frame: &Frame) -> Result<Option<DecodedPayload>, DecodeError> {
            Ok(None)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        loads: Arc<AtomicUsize>,
        fail: bool,
    }

    impl SoftwareDecoderLoader for CountingLoader {
        fn load(&self, _config: &ScanConfig) -> Result<Box<dyn QrDecoder>, LoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LoadError("missing".into()));
            }
            Ok(Box::new(StubDecoder))
        }
    }

    fn select(
        capability: Option<&FakeCapability>,
        loader: &CountingLoader,
    ) -> Result<SelectedDecoder, LoadError> {
        select_decoder(
            capability.map(|c| c as &dyn BarcodeCapability),
            loader,
            &ScanConfig::default(),
        )
    }

    #[test]
    fn test_native_selected_when_qr_supported() {
        let capability = FakeCapability::new(Ok(vec![Symbology::Ean13, Symbology::QrCode]));
        let loader = CountingLoader::default();

        let selected = select(Some(&capability), &loader).unwrap();
        assert_eq!(selected.choice, DecoderChoice::Native);
        assert_eq!(selected.decoder.name(), "native");
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_native_detector_bound_to_qr_only() {
        let capability = FakeCapability::new(Ok(vec![Symbology::Ean13, Symbology::QrCode]));
        let loader = CountingLoader::default();
        select(Some(&capability), &loader).unwrap();
        assert_eq!(*capability.requested.lock().unwrap(), vec![Symbology::QrCode]);
    }

    #[test]
    fn test_native_decoder_is_usable() {
        let capability = FakeCapability::new(Ok(vec![Symbology::QrCode]));
        let loader = CountingLoader::default();
        let mut selected = select(Some(&capability), &loader).unwrap();
        let frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        assert_eq!(
            selected.decoder.detect(&frame).unwrap(),
            Some(DecodedPayload::new("ID-1"))
        );
    }

    #[test]
    fn test_software_selected_without_capability() {
        let loader = CountingLoader::default();
        let selected = select(None, &loader).unwrap();
        assert_eq!(selected.choice, DecoderChoice::Software);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_software_selected_when_qr_unsupported() {
        let capability = FakeCapability::new(Ok(vec![Symbology::Ean13, Symbology::Code128]));
        let loader = CountingLoader::default();
        let selected = select(Some(&capability), &loader).unwrap();
        assert_eq!(selected.choice, DecoderChoice::Software);
        assert!(capability.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn test_probe_failure_falls_back_to_software() {
        let capability = FakeCapability::new(Err(CapabilityError::Probe("denied".into())));
        let loader = CountingLoader::default();
        let selected = select(Some(&capability), &loader).unwrap();
        assert_eq!(selected.choice, DecoderChoice::Software);
    }

    #[test]
    fn test_construction_failure_falls_back_to_software() {
        let mut capability = FakeCapability::new(Ok(vec![Symbology::QrCode]));
        capability.construct_fails = true;
        let loader = CountingLoader::default();
        let selected = select(Some(&capability), &loader).unwrap();
        assert_eq!(selected.choice, DecoderChoice::Software);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_software_load_failure_is_error() {
        let loader = CountingLoader {
            fail: true,
            ..CountingLoader::default()
        };
        assert!(select(None, &loader).is_err());
    }
}
