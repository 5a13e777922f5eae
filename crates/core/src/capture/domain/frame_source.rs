use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum FrameSourceError {
    #[error("failed to open {location}: {reason}")]
    Open { location: String, reason: String },
    #[error("no video stream in {0}")]
    NoVideoStream(String),
    #[error("no images found in {0}")]
    NoImages(String),
    #[error("failed to read {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Ffmpeg(#[from] ffmpeg_next::Error),
}

/// Live feed of camera frames.
///
/// Owned by the capture subsystem; the scan core only asks whether a usable
/// frame exists and takes read-only snapshots of it.
pub trait FrameSource: Send {
    /// Acquires the underlying device or stream. Failure is fatal to
    /// session start-up.
    fn open(&mut self) -> Result<(), FrameSourceError>;

    /// True when enough data is buffered to produce a decodable frame.
    fn has_enough_data(&self) -> bool;

    /// `(width, height)` of the current frame, if known.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Snapshot of the most recent frame.
    fn current_frame(&mut self) -> Option<Frame>;

    /// True once a finite source has no more frames to offer.
    fn has_ended(&self) -> bool {
        false
    }

    /// Releases the device or stream. Safe to call more than once.
    fn release(&mut self);
}
