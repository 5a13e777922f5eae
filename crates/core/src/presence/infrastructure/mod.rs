pub mod console_presenter;
pub mod overlay_catalog;
