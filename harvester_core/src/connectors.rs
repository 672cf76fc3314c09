//! Sources and sinks at the two ends of a chain

pub mod local;
pub mod memory;
pub mod stdout;

pub use local::{Archiver, FileReader, FileWriter};
pub use memory::MemorySource;
pub use stdout::Printer;
