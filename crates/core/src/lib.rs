//! Detection-and-persistence engine for QR-keyed overlays.
//!
//! A [`scanning::scan_session::ScanSession`] samples a
//! [`capture::domain::frame_source::FrameSource`] once per render tick,
//! rate-limits decode attempts, and feeds the results into a debounced
//! [`presence::domain::presence_state_machine::PresenceStateMachine`] whose
//! events drive an [`presence::domain::overlay_presenter::OverlayPresenter`].

pub mod capture;
pub mod decoding;
pub mod presence;
pub mod scanning;
pub mod shared;

#[cfg(test)]
mod test_support;
