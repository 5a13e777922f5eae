use image::imageops::FilterType;
use image::{GrayImage, ImageBuffer, Luma, Rgb, Rgba};

use crate::decoding::domain::qr_decoder::{DecodeError, DecodedPayload, QrDecoder};
use crate::shared::frame::Frame;
use crate::shared::scan_config::InversionMode;

/// Pure-Rust fallback decoder built on `rqrr`.
///
/// Every frame is downsampled to `target_width` (aspect ratio preserved)
/// and converted to luma before grid detection. With
/// [`InversionMode::DontInvert`] only dark-on-light symbols are tried,
/// which roughly halves decode cost at the price of missing inverted codes.
pub struct SoftwareDecoder {
    target_width: u32,
    inversion: InversionMode,
}

impl SoftwareDecoder {
    pub fn new(target_width: u32, inversion: InversionMode) -> Self {
        Self {
            target_width: target_width.max(1),
            inversion,
        }
    }

    fn to_scaled_luma(&self, frame: &Frame) -> Result<GrayImage, DecodeError> {
        let (w, h) = (frame.width(), frame.height());
        let (tw, th) = scaled_dimensions(w, h, self.target_width);
        let mismatch = || DecodeError::Frame(format!("pixel buffer does not match {w}x{h}"));

        match frame.channels() {
            1 => {
                let src = ImageBuffer::<Luma<u8>, &[u8]>::from_raw(w, h, frame.data())
                    .ok_or_else(mismatch)?;
                Ok(image::imageops::resize(&src, tw, th, FilterType::Triangle))
            }
            3 => {
                let src = ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(w, h, frame.data())
                    .ok_or_else(mismatch)?;
                let scaled = image::imageops::resize(&src, tw, th, FilterType::Triangle);
                Ok(image::imageops::grayscale(&scaled))
            }
            4 => {
                let src = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(w, h, frame.data())
                    .ok_or_else(mismatch)?;
                let scaled = image::imageops::resize(&src, tw, th, FilterType::Triangle);
                Ok(image::imageops::grayscale(&scaled))
            }
            n => Err(DecodeError::Frame(format!("unsupported channel count {n}"))),
        }
    }
}

/// Output size for a frame downsampled to `target_width`.
///
/// `scale = target_width / max(1, width)`; both sides are floored and kept
/// at least one pixel.
pub fn scaled_dimensions(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    let denom = u64::from(width.max(1));
    let scale = |side: u32| {
        let scaled = u64::from(side) * u64::from(target_width) / denom;
        u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
    };
    (scale(width), scale(height))
}

fn decode_luma(luma: &GrayImage, invert: bool) -> Option<String> {
    let (w, h) = luma.dimensions();
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
            let v = luma.get_pixel(x as u32, y as u32).0[0];
            if invert {
                255 - v
            } else {
                v
            }
        });
    prepared
        .detect_grids()
        .into_iter()
        .find_map(|grid| grid.decode().ok().map(|(_, content)| content))
        .filter(|content| !content.is_empty())
}

impl QrDecoder for SoftwareDecoder {
    fn detect(&mut self, frame: &Frame) -> Result<Option<DecodedPayload>, DecodeError> {
        if frame.is_empty() {
            return Ok(None);
        }
        let luma = self.to_scaled_luma(frame)?;

        let found = match self.inversion {
            InversionMode::DontInvert => decode_luma(&luma, false),
            InversionMode::AttemptBoth => {
                decode_luma(&luma, false).or_else(|| decode_luma(&luma, true))
            }
        };
        Ok(found.map(DecodedPayload::new))
    }

    fn name(&self) -> &str {
        "software"
    }
}
