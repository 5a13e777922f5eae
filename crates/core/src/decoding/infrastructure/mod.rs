pub mod decoder_factory;
pub mod native_decoder;
pub mod software_decoder;
pub mod software_loader;
