use std::time::Duration;

use crate::decoding::domain::qr_decoder::DecodedPayload;
use crate::shared::timestamp::Timestamp;

/// Whether an identifier is currently considered on screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PresenceState {
    #[default]
    Empty,
    Active { id: String, last_seen_at: Timestamp },
}

/// Lifecycle notification produced by one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    Activate(String),
    KeepAlive(String),
    Deactivate,
}

/// Debounced presence tracking for decoded identifiers.
///
/// A different identifier takes over immediately. Losing the identifier is
/// debounced: the state only returns to `Empty` once no decode has been
/// seen for strictly longer than `hold_duration`. Performs no rendering;
/// callers forward the returned event to a presenter.
pub struct PresenceStateMachine {
    hold_duration: Duration,
    state: PresenceState,
}

impl PresenceStateMachine {
    pub fn new(hold_duration: Duration) -> Self {
        Self {
            hold_duration,
            state: PresenceState::Empty,
        }
    }

    pub fn state(&self) -> &PresenceState {
        &self.state
    }

    pub fn active_id(&self) -> Option<&str> {
        match &self.state {
            PresenceState::Active { id, .. } => Some(id),
            PresenceState::Empty => None,
        }
    }

    pub fn hold_duration(&self) -> Duration {
        self.hold_duration
    }

    /// Applies one tick's decode result. Returns at most one event.
    pub fn observe(
        &mut self,
        payload: Option<&DecodedPayload>,
        now: Timestamp,
    ) -> Option<PresenceEvent> {
        match payload {
            Some(p) => Some(self.on_detection(p, now)),
            None => self.on_miss(now),
        }
    }

    /// Drops any active identifier without emitting an event.
    pub fn reset(&mut self) {
        self.state = PresenceState::Empty;
    }

    fn on_detection(&mut self, payload: &DecodedPayload, now: Timestamp) -> PresenceEvent {
        if let PresenceState::Active { id, last_seen_at } = &mut self.state {
            if id.as_str() == payload.as_str() {
                // Ticks may arrive with a stale timestamp; never move backwards.
                *last_seen_at = (*last_seen_at).max(now);
                return PresenceEvent::KeepAlive(id.clone());
            }
        }

        let id = payload.as_str().to_string();
        self.state = PresenceState::Active {
            id: id.clone(),
            last_seen_at: now,
        };
        PresenceEvent::Activate(id)
    }

    fn on_miss(&mut self, now: Timestamp) -> Option<PresenceEvent> {
        let PresenceState::Active { last_seen_at, .. } = &self.state else {
            return None;
        };
        if now.saturating_since(*last_seen_at) <= self.hold_duration {
            return None;
        }
        self.state = PresenceState::Empty;
        Some(PresenceEvent::Deactivate)
    }
}
