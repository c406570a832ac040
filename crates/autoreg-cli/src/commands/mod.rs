//! CLI command implementations

pub mod extract_silence;
pub mod generate;
pub mod init_model;
