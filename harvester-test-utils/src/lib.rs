//! Test utilities for Harvester
//!
//! This crate provides mock stages and sources plus directory fixtures for
//! testing transfer chains end to end.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::TransferDirs;
pub use mocks::{Deliveries, Delivery, FailingStage, RecordingSink, ScriptedSource};
