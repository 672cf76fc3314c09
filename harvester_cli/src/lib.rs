//! Harvester command line support: configuration loading and output rendering

pub mod config;
pub mod output;
