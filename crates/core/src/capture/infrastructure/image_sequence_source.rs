use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::capture::domain::frame_source::{FrameSource, FrameSourceError};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::timestamp::{Clock, Timestamp};

/// Replays still images as if they were a live camera feed.
///
/// `location` is either one image file or a directory; directory entries
/// with a recognised image extension are played in file-name order, one
/// every `1 / fps` seconds of `clock` time.
pub struct ImageSequenceSource {
    location: PathBuf,
    fps: f64,
    looping: bool,
    clock: Arc<dyn Clock>,
    frames: Vec<Frame>,
    opened_at: Option<Timestamp>,
}

impl ImageSequenceSource {
    pub fn new(location: impl Into<PathBuf>, fps: f64, clock: Arc<dyn Clock>) -> Self {
        Self {
            location: location.into(),
            fps: if fps > 0.0 { fps } else { 1.0 },
            looping: false,
            clock,
            frames: Vec::new(),
            opened_at: None,
        }
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the frame "on screen" right now, ignoring looping.
    fn playhead(&self) -> Option<usize> {
        let opened_at = self.opened_at?;
        let elapsed = self.clock.now().saturating_since(opened_at).as_secs_f64();
        Some((elapsed * self.fps).floor() as usize)
    }

    fn current_index(&self) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }
        let head = self.playhead()?;
        if self.looping {
            Some(head % self.frames.len())
        } else if head < self.frames.len() {
            Some(head)
        } else {
            None
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn collect_image_paths(location: &Path) -> Result<Vec<PathBuf>, FrameSourceError> {
    if location.is_file() {
        return Ok(vec![location.to_path_buf()]);
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(location)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    paths.sort();
    Ok(paths)
}

fn load_frame(path: &Path, index: usize) -> Result<Frame, FrameSourceError> {
    let img = image::open(path)
        .map_err(|source| FrameSourceError::Image {
            path: path.display().to_string(),
            source,
        })?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}

impl FrameSource for ImageSequenceSource {
    fn open(&mut self) -> Result<(), FrameSourceError> {
        if !self.location.exists() {
            return Err(FrameSourceError::Open {
                location: self.location.display().to_string(),
                reason: "path does not exist".into(),
            });
        }
        let paths = collect_image_paths(&self.location)?;
        if paths.is_empty() {
            return Err(FrameSourceError::NoImages(
                self.location.display().to_string(),
            ));
        }
        self.frames = paths
            .iter()
            .enumerate()
            .map(|(i, p)| load_frame(p, i))
            .collect::<Result<_, _>>()?;
        self.opened_at = Some(self.clock.now());
        log::info!(
            "Replaying {} image(s) from {} at {} fps",
            self.frames.len(),
            self.location.display(),
            self.fps
        );
        Ok(())
    }

    fn has_enough_data(&self) -> bool {
        self.current_index().is_some()
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.current_index()
            .map(|i| (self.frames[i].width(), self.frames[i].height()))
    }

    fn current_frame(&mut self) -> Option<Frame> {
        self.current_index().map(|i| self.frames[i].clone())
    }

    fn has_ended(&self) -> bool {
        if self.looping || self.frames.is_empty() {
            return false;
        }
        self.playhead()
            .map(|head| head >= self.frames.len())
            .unwrap_or(false)
    }

    fn release(&mut self) {
        self.frames.clear();
        self.opened_at = None;
    }
}
