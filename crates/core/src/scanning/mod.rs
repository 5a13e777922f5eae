pub mod decode_dispatch;
pub mod render_ticker;
pub mod scan_scheduler;
pub mod scan_session;
pub mod scan_stats;
pub mod stop_handle;
