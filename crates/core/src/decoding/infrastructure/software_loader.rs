use thiserror::Error;

use crate::decoding::domain::qr_decoder::QrDecoder;
use crate::shared::scan_config::ScanConfig;

use super::software_decoder::SoftwareDecoder;

#[derive(Error, Debug)]
#[error("software decoder unavailable: {0}")]
pub struct LoadError(pub String);

/// Brings up the fallback decoder. Only invoked when no usable native
/// capability exists, and always before the first tick runs.
pub trait SoftwareDecoderLoader: Send + Sync {
    fn load(&self, config: &ScanConfig) -> Result<Box<dyn QrDecoder>, LoadError>;
}

/// Loads the `rqrr`-backed decoder compiled into this crate.
pub struct BundledSoftwareLoader;

impl SoftwareDecoderLoader for BundledSoftwareLoader {
    fn load(&self, config: &ScanConfig) -> Result<Box<dyn QrDecoder>, LoadError> {
        if config.software_target_width == 0 {
            return Err(LoadError("target width must be at least 1".into()));
        }
        log::debug!(
            "Loading bundled software decoder (target_width={}, inversion={})",
            config.software_target_width,
            config.inversion
        );
        Ok(Box::new(SoftwareDecoder::new(
            config.software_target_width,
            config.inversion,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_loader_yields_software_decoder() {
        let decoder = BundledSoftwareLoader.load(&ScanConfig::default()).unwrap();
        assert_eq!(decoder.name(), "software");
    }

    #[test]
    fn test_bundled_loader_rejects_zero_width() {
        let config = ScanConfig {
            software_target_width: 0,
            ..ScanConfig::default()
        };
        assert!(BundledSoftwareLoader.load(&config).is_err());
    }
}
