//! Fixture builders

mod dirs;

pub use dirs::TransferDirs;
