//! Fakes shared by the unit tests of several modules.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::capture::domain::frame_source::{FrameSource, FrameSourceError};
use crate::decoding::domain::qr_decoder::{DecodeError, DecodedPayload, QrDecoder};
use crate::presence::domain::overlay_presenter::OverlayPresenter;
use crate::scanning::stop_handle::StopHandle;
use crate::shared::frame::Frame;

const MODULE_PX: usize = 12;
const QUIET_MODULES: usize = 4;

/// Renders `text` as a QR symbol centred on an RGB frame.
pub fn qr_frame(text: &str, frame_w: u32, frame_h: u32, inverted: bool) -> Frame {
    let code = qrcode::QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width();
    let colors = code.to_colors();
    let (light, dark) = if inverted { (0u8, 255u8) } else { (255u8, 0u8) };

    let (fw, fh) = (frame_w as usize, frame_h as usize);
    let mut data = vec![light; fw * fh * 3];
    let symbol_px = (modules + 2 * QUIET_MODULES) * MODULE_PX;
    assert!(symbol_px <= fw && symbol_px <= fh, "frame too small for symbol");
    let left = (fw - symbol_px) / 2 + QUIET_MODULES * MODULE_PX;
    let top = (fh - symbol_px) / 2 + QUIET_MODULES * MODULE_PX;

    for my in 0..modules {
        for mx in 0..modules {
            if colors[my * modules + mx] != qrcode::Color::Dark {
                continue;
            }
            for py in 0..MODULE_PX {
                for px in 0..MODULE_PX {
                    let x = left + mx * MODULE_PX + px;
                    let y = top + my * MODULE_PX + py;
                    let idx = (y * fw + x) * 3;
                    data[idx..idx + 3].fill(dark);
                }
            }
        }
    }
    Frame::new(data, frame_w, frame_h, 3, 0)
}

/// Observable flags of a [`FakeSource`], kept after the source is boxed.
#[derive(Clone, Default)]
pub struct SourceProbe {
    pub ready: Arc<AtomicBool>,
    pub ended: Arc<AtomicBool>,
    pub opened: Arc<AtomicBool>,
    pub released: Arc<AtomicBool>,
}

pub struct FakeSource {
    probe: SourceProbe,
    frame: Frame,
    fail_open: bool,
    served: usize,
}

impl FakeSource {
    pub fn new() -> (Self, SourceProbe) {
        Self::with_frame(Frame::new(vec![0u8; 3], 1, 1, 3, 0))
    }

    pub fn with_frame(frame: Frame) -> (Self, SourceProbe) {
        let probe = SourceProbe::default();
        probe.ready.store(true, Ordering::SeqCst);
        let source = Self {
            probe: probe.clone(),
            frame,
            fail_open: false,
            served: 0,
        };
        (source, probe)
    }

    pub fn failing() -> (Self, SourceProbe) {
        let (mut source, probe) = Self::new();
        source.fail_open = true;
        (source, probe)
    }
}

impl FrameSource for FakeSource {
    fn open(&mut self) -> Result<(), FrameSourceError> {
        if self.fail_open {
            return Err(FrameSourceError::Open {
                location: "fake".into(),
                reason: "permission denied".into(),
            });
        }
        self.probe.opened.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn has_enough_data(&self) -> bool {
        self.probe.ready.load(Ordering::SeqCst) && !self.probe.released.load(Ordering::SeqCst)
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.frame.width(), self.frame.height()))
    }

    fn current_frame(&mut self) -> Option<Frame> {
        if !self.has_enough_data() {
            return None;
        }
        let frame = Frame::new(
            self.frame.data().to_vec(),
            self.frame.width(),
            self.frame.height(),
            self.frame.channels(),
            self.served,
        );
        self.served += 1;
        Some(frame)
    }

    fn has_ended(&self) -> bool {
        self.probe.ended.load(Ordering::SeqCst)
    }

    fn release(&mut self) {
        self.probe.released.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Step {
    Hit(&'static str),
    Miss,
    Fail,
}

/// Replays one [`Step`] per call, then keeps missing.
pub struct ScriptedDecoder {
    steps: VecDeque<Step>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedDecoder {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let decoder = Self {
            steps: steps.into_iter().collect(),
            calls: Arc::clone(&calls),
        };
        (decoder, calls)
    }
}

impl QrDecoder for ScriptedDecoder {
    fn detect(&mut self, _frame: &Frame) -> Result<Option<DecodedPayload>, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.steps.pop_front().unwrap_or(Step::Miss) {
            Step::Hit(text) => Ok(Some(DecodedPayload::new(text))),
            Step::Miss => Ok(None),
            Step::Fail => Err(DecodeError::Frame("sensor glitch".into())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Records every notification as a string; may stop a scheduler on
/// activation.
#[derive(Default)]
pub struct RecordingPresenter {
    calls: Arc<Mutex<Vec<String>>>,
    stop_on_activate: Option<StopHandle>,
}

impl RecordingPresenter {
    pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let presenter = Self::default();
        let calls = Arc::clone(&presenter.calls);
        (presenter, calls)
    }

    pub fn stopping(handle: StopHandle) -> (Self, Arc<Mutex<Vec<String>>>) {
        let (mut presenter, calls) = Self::new();
        presenter.stop_on_activate = Some(handle);
        (presenter, calls)
    }
}

impl OverlayPresenter for RecordingPresenter {
    fn activate(&mut self, id: &str) {
        self.calls.lock().unwrap().push(format!("activate:{id}"));
        if let Some(handle) = &self.stop_on_activate {
            handle.stop();
        }
    }

    fn keep_alive(&mut self, id: &str) {
        self.calls.lock().unwrap().push(format!("keep_alive:{id}"));
    }

    fn deactivate(&mut self) {
        self.calls.lock().unwrap().push("deactivate".into());
    }
}

pub fn recorded(calls: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    calls.lock().unwrap().clone()
}
