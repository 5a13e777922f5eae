pub mod constants;
pub mod frame;
pub mod scan_config;
pub mod timestamp;
