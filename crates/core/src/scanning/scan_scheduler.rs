use std::time::Duration;

use crate::capture::domain::frame_source::FrameSource;
use crate::decoding::domain::qr_decoder::DecodedPayload;
use crate::presence::domain::overlay_presenter::OverlayPresenter;
use crate::presence::domain::presence_state_machine::{PresenceEvent, PresenceStateMachine};
use crate::shared::frame::Frame;
use crate::shared::scan_config::ScanConfig;
use crate::shared::timestamp::Timestamp;

use super::decode_dispatch::DecodeDispatch;
use super::render_ticker::RenderTicker;
use super::scan_stats::ScanStats;
use super::stop_handle::StopHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Render-synchronised scan loop.
///
/// Every tick feeds the presence machine, but a decode is only started when
/// the previous attempt is at least `min_decode_interval` old and no decode
/// is still in flight. Decode failures and missing frames count as "nothing
/// decoded" for that tick.
pub struct ScanScheduler {
    source: Box<dyn FrameSource>,
    dispatch: Box<dyn DecodeDispatch>,
    presence: PresenceStateMachine,
    presenter: Box<dyn OverlayPresenter>,
    min_interval: Duration,
    stop_handle: StopHandle,
    state: SchedulerState,
    last_attempt_at: Option<Timestamp>,
    stats: ScanStats,
}

impl ScanScheduler {
    pub fn new(
        source: Box<dyn FrameSource>,
        dispatch: Box<dyn DecodeDispatch>,
        presenter: Box<dyn OverlayPresenter>,
        config: &ScanConfig,
    ) -> Self {
        Self {
            source,
            dispatch,
            presence: PresenceStateMachine::new(config.hold_duration()),
            presenter,
            min_interval: config.min_decode_interval(),
            stop_handle: StopHandle::new(),
            state: SchedulerState::Stopped,
            last_attempt_at: None,
            stats: ScanStats::default(),
        }
    }

    /// Shares the scheduler's cancellation flag. Lets a presenter built
    /// before the scheduler stop it.
    pub fn with_stop_handle(mut self, handle: StopHandle) -> Self {
        self.stop_handle = handle;
        self
    }

    /// Starts ticking. One-shot: once stopped, the source is released and
    /// the scheduler stays stopped.
    pub fn start(&mut self) {
        if self.state == SchedulerState::Running {
            return;
        }
        if self.stop_handle.is_stopped() {
            log::warn!("Ignoring start on a stopped scheduler");
            return;
        }
        self.state = SchedulerState::Running;
        self.last_attempt_at = None;
        log::info!(
            "Scanning with {} decoder every {}ms",
            self.dispatch.decoder_name(),
            self.min_interval.as_millis()
        );
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running && !self.stop_handle.is_stopped()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop_handle.clone()
    }

    pub fn presence(&self) -> &PresenceStateMachine {
        &self.presence
    }

    pub fn decoder_name(&self) -> &str {
        self.dispatch.decoder_name()
    }

    pub fn stats(&self) -> ScanStats {
        let mut stats = self.stats.clone();
        stats.late_results_discarded += self.dispatch.discarded();
        stats
    }

    /// Runs one render tick at `now` and returns the event it emitted.
    pub fn tick(&mut self, now: Timestamp) -> Option<PresenceEvent> {
        if self.stop_handle.is_stopped() {
            self.stop();
        }
        if self.state != SchedulerState::Running {
            return None;
        }
        self.stats.ticks += 1;

        if self.dispatch.is_idle() && self.decode_due(now) {
            self.last_attempt_at = Some(now);
            self.stats.decode_attempts += 1;
            match self.available_frame() {
                Some(frame) => self.dispatch.submit(frame),
                None => self.stats.frames_unavailable += 1,
            }
        }

        let payload = self.collect_result();
        if self.stop_handle.is_stopped() {
            self.stop();
            return None;
        }

        let event = self.presence.observe(payload.as_ref(), now)?;
        self.stats.record_event(&event);
        match &event {
            PresenceEvent::Activate(id) => log::info!("Activate {id} at {now}"),
            PresenceEvent::KeepAlive(id) => log::trace!("Keep-alive {id} at {now}"),
            PresenceEvent::Deactivate => log::info!("Deactivate at {now}"),
        }
        event.dispatch_to(self.presenter.as_mut());

        if self.stop_handle.is_stopped() {
            self.stop();
        }
        Some(event)
    }

    /// Ticks until stopped, the ticker runs dry, or the source ends.
    pub fn run(&mut self, ticker: &mut dyn RenderTicker) -> ScanStats {
        self.start();
        while self.is_running() {
            if self.source.has_ended() {
                log::info!("Frame source ended");
                break;
            }
            let Some(now) = ticker.next_tick() else {
                log::debug!("Render ticker exhausted");
                break;
            };
            self.tick(now);
        }
        self.stop();
        self.stats()
    }

    /// Cancels the in-flight decode, resets presence, and releases the
    /// source. Idempotent.
    pub fn stop(&mut self) {
        self.stop_handle.stop();
        if self.state == SchedulerState::Stopped {
            return;
        }
        self.state = SchedulerState::Stopped;
        self.dispatch.cancel();
        self.presence.reset();
        self.source.release();
        log::info!("{}", self.stats().summary());
    }

    fn decode_due(&self, now: Timestamp) -> bool {
        self.last_attempt_at
            .map(|last| now.saturating_since(last) >= self.min_interval)
            .unwrap_or(true)
    }

    fn available_frame(&mut self) -> Option<Frame> {
        if !self.source.has_enough_data() {
            return None;
        }
        self.source.current_frame()
    }

    fn collect_result(&mut self) -> Option<DecodedPayload> {
        let outcome = self.dispatch.poll()?;
        if self.stop_handle.is_stopped() {
            self.stats.late_results_discarded += 1;
            return None;
        }
        match outcome {
            Ok(Some(payload)) => {
                self.stats.detections += 1;
                Some(payload)
            }
            Ok(None) => None,
            Err(e) => {
                self.stats.transient_errors += 1;
                log::debug!("Decode failed, treating tick as no detection: {e}");
                None
            }
        }
    }
}

impl Drop for ScanScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
