use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::capture::domain::frame_source::{FrameSource, FrameSourceError};
use crate::shared::frame::Frame;

type OpenResult = Result<(u32, u32), FrameSourceError>;

/// State shared between the capture thread and the scan loop.
#[derive(Default)]
struct CaptureShared {
    latest: Mutex<Option<Frame>>,
    stop: AtomicBool,
    ended: AtomicBool,
}

/// Camera, stream, or video file decoded by ffmpeg-next on a capture thread.
///
/// `location` is anything libavformat can open: a V4L2 device such as
/// `/dev/video0`, a network stream URL, or a file. Only the most recent
/// frame is kept; older frames are overwritten as new ones decode. Regular
/// files are paced to their stream frame rate so they behave like a live
/// feed.
pub struct FfmpegFrameSource {
    location: String,
    shared: Arc<CaptureShared>,
    dimensions: Option<(u32, u32)>,
    handle: Option<JoinHandle<()>>,
}

impl FfmpegFrameSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            shared: Arc::new(CaptureShared::default()),
            dimensions: None,
            handle: None,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self) -> Result<(), FrameSourceError> {
        self.release();
        self.shared = Arc::new(CaptureShared::default());

        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<OpenResult>(1);
        let location = self.location.clone();
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name("qr-capture".into())
            .spawn(move || run_capture(&location, ready_tx, &shared))?;

        let opened = ready_rx.recv().unwrap_or_else(|_| {
            Err(FrameSourceError::Open {
                location: self.location.clone(),
                reason: "capture thread exited before the stream opened".into(),
            })
        });
        match opened {
            Ok(dims) => {
                log::info!("Opened {} ({}x{})", self.location, dims.0, dims.1);
                self.dimensions = Some(dims);
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                let _ = handle.join();
                Err(e)
            }
        }
    }

    fn has_enough_data(&self) -> bool {
        self.shared
            .latest
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    fn current_frame(&mut self) -> Option<Frame> {
        self.shared.latest.lock().ok().and_then(|slot| slot.clone())
    }

    fn has_ended(&self) -> bool {
        self.shared.ended.load(Ordering::SeqCst)
    }

    fn release(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        if let Ok(mut slot) = self.shared.latest.lock() {
            *slot = None;
        }
        self.dimensions = None;
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        self.release();
    }
}

fn run_capture(location: &str, ready_tx: Sender<OpenResult>, shared: &CaptureShared) {
    let mut capture = match Capture::open(location) {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok((capture.width, capture.height)));

    if let Err(e) = capture.pump(shared) {
        log::warn!("Capture from {location} stopped: {e}");
    }
    shared.ended.store(true, Ordering::SeqCst);
}

/// Decoder state owned by the capture thread. ffmpeg contexts are created
/// and dropped on that thread only.
struct Capture {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    stream_index: usize,
    pace: Option<Duration>,
}

impl Capture {
    fn open(location: &str) -> Result<Self, FrameSourceError> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let open_err = |e: ffmpeg_next::Error| FrameSourceError::Open {
            location: location.to_string(),
            reason: e.to_string(),
        };

        let ictx = ffmpeg_next::format::input(&location).map_err(open_err)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| FrameSourceError::NoVideoStream(location.to_string()))?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let rate = stream.rate();
        let pace = if Path::new(location).is_file() && rate.numerator() > 0 {
            Some(Duration::from_secs_f64(
                rate.denominator() as f64 / rate.numerator() as f64,
            ))
        } else {
            None
        };

        Ok(Self {
            ictx,
            decoder,
            scaler,
            width,
            height,
            stream_index,
            pace,
        })
    }

    fn pump(&mut self, shared: &CaptureShared) -> Result<(), FrameSourceError> {
        let Capture {
            ictx,
            decoder,
            scaler,
            width,
            height,
            stream_index,
            pace,
        } = self;
        let mut publisher = Publisher {
            shared,
            width: *width,
            height: *height,
            pace: *pace,
            index: 0,
        };

        for (stream, packet) in ictx.packets() {
            if shared.stop.load(Ordering::SeqCst) {
                return Ok(());
            }
            if stream.index() != *stream_index {
                continue;
            }
            if decoder.send_packet(&packet).is_err() {
                continue;
            }
            publisher.drain(decoder, scaler)?;
        }

        let _ = decoder.send_eof();
        publisher.drain(decoder, scaler)
    }
}

struct Publisher<'a> {
    shared: &'a CaptureShared,
    width: u32,
    height: u32,
    pace: Option<Duration>,
    index: usize,
}

impl Publisher<'_> {
    fn drain(
        &mut self,
        decoder: &mut ffmpeg_next::decoder::Video,
        scaler: &mut ffmpeg_next::software::scaling::Context,
    ) -> Result<(), FrameSourceError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while decoder.receive_frame(&mut decoded).is_ok() {
            if self.shared.stop.load(Ordering::SeqCst) {
                return Ok(());
            }
            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&decoded, &mut rgb_frame)?;
            let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
            let frame = Frame::new(pixels, self.width, self.height, 3, self.index);
            self.index += 1;
            if let Ok(mut slot) = self.shared.latest.lock() {
                *slot = Some(frame);
            }
            if let Some(interval) = self.pace {
                std::thread::sleep(interval);
            }
        }
        Ok(())
    }
}

/// Copies pixel data from an ffmpeg frame into a tightly-packed RGB buffer,
/// dropping any per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
