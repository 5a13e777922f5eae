pub mod overlay_presenter;
pub mod presence_state_machine;
