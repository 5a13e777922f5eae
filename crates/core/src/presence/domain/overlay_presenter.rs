use super::presence_state_machine::PresenceEvent;

/// Receives overlay lifecycle notifications.
///
/// Resolving an identifier to displayable content is the presenter's job;
/// the scan core has no opinion on whether an identifier is known.
pub trait OverlayPresenter: Send {
    fn activate(&mut self, id: &str);

    /// The active code was seen again. Informational only.
    fn keep_alive(&mut self, _id: &str) {}

    fn deactivate(&mut self);
}

impl PresenceEvent {
    pub fn dispatch_to(&self, presenter: &mut dyn OverlayPresenter) {
        match self {
            PresenceEvent::Activate(id) => presenter.activate(id),
            PresenceEvent::KeepAlive(id) => presenter.keep_alive(id),
            PresenceEvent::Deactivate => presenter.deactivate(),
        }
    }
}
