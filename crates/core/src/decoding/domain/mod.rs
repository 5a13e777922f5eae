pub mod native_capability;
pub mod qr_decoder;
pub mod symbology;
