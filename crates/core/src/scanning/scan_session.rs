use thiserror::Error;

use crate::capture::domain::frame_source::{FrameSource, FrameSourceError};
use crate::decoding::domain::native_capability::BarcodeCapability;
use crate::decoding::infrastructure::decoder_factory::{select_decoder, DecoderChoice};
use crate::decoding::infrastructure::software_loader::{LoadError, SoftwareDecoderLoader};
use crate::presence::domain::overlay_presenter::OverlayPresenter;
use crate::shared::scan_config::{ConfigError, ScanConfig};
use crate::shared::timestamp::Timestamp;

use super::decode_dispatch::{DecodeDispatch, InlineDispatch, WorkerDispatch};
use super::render_ticker::RenderTicker;
use super::scan_scheduler::{ScanScheduler, SchedulerState};
use super::scan_stats::ScanStats;
use super::stop_handle::StopHandle;

/// Failures that abort session start-up. Nothing that happens once ticks
/// run is reported this way.
#[derive(Error, Debug)]
pub enum StartError {
    #[error("camera unavailable: {0}")]
    Camera(#[from] FrameSourceError),
    #[error(transparent)]
    SoftwareDecoder(#[from] LoadError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start decode worker: {0}")]
    Worker(#[source] std::io::Error),
}

/// One scanning session: camera, decoder, and presence state bundled with
/// a `create -> start -> stop -> discard` lifecycle.
pub struct ScanSession {
    scheduler: ScanScheduler,
    choice: DecoderChoice,
}

impl ScanSession {
    /// Acquires the camera, then picks a decoder, then starts scheduling.
    ///
    /// The camera is released again if any later step fails.
    pub fn start(
        config: &ScanConfig,
        mut source: Box<dyn FrameSource>,
        capability: Option<&dyn BarcodeCapability>,
        loader: &dyn SoftwareDecoderLoader,
        presenter: Box<dyn OverlayPresenter>,
        stop_handle: StopHandle,
    ) -> Result<Self, StartError> {
        config.validate()?;
        source.open()?;
        if let Some((w, h)) = source.dimensions() {
            log::debug!("Camera acquired at {w}x{h}");
        }

        let selected = match select_decoder(capability, loader, config) {
            Ok(selected) => selected,
            Err(e) => {
                source.release();
                return Err(e.into());
            }
        };

        let dispatch: Box<dyn DecodeDispatch> = if config.background_decode {
            match WorkerDispatch::spawn(selected.decoder) {
                Ok(worker) => Box::new(worker),
                Err(e) => {
                    source.release();
                    return Err(StartError::Worker(e));
                }
            }
        } else {
            Box::new(InlineDispatch::new(selected.decoder))
        };

        let mut scheduler =
            ScanScheduler::new(source, dispatch, presenter, config).with_stop_handle(stop_handle);
        scheduler.start();
        log::info!(
            "Scan session started ({} decoder, hold {}ms)",
            selected.choice,
            config.hold_duration_ms
        );

        Ok(Self {
            scheduler,
            choice: selected.choice,
        })
    }

    pub fn decoder_choice(&self) -> DecoderChoice {
        self.choice
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.state() == SchedulerState::Running
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.scheduler.stop_handle()
    }

    pub fn stats(&self) -> ScanStats {
        self.scheduler.stats()
    }

    pub fn tick(&mut self, now: Timestamp) {
        self.scheduler.tick(now);
    }

    pub fn run(&mut self, ticker: &mut dyn RenderTicker) -> ScanStats {
        self.scheduler.run(ticker)
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.stop();
    }
}
