//! Harvester Core Library
//!
//! This is the core library for Harvester, a managed file transfer engine:
//! sources list and open artifacts, a chain of stages transforms them, and a
//! sink delivers them. Every byte moved goes through an audited copy.

pub mod audit;
pub mod chain;
pub mod codec;
pub mod config;
pub mod connectors;
pub mod error;
pub mod filename;
pub mod hashing;
pub mod job;
pub mod rename;
pub mod splitter;

// Re-export main types
pub use audit::{AuditReport, Auditor, DEFAULT_CHUNK_SIZE, audited_copy};
pub use chain::{Content, NextProcessor, Processor, SeekableStream, Source};
pub use codec::{GzipCompressor, GzipDecompressor, ZipCompressor, ZipExtractor};
pub use config::{JobConfig, JobSettings, ProcessorConfig, SinkConfig, SourceConfig};
pub use connectors::{Archiver, FileReader, FileWriter, MemorySource, Printer};
pub use error::{Error, Result};
pub use filename::{FilenameTemplate, archive_subpath, transform_filename};
pub use hashing::{HashAlgorithm, StreamingHasher};
pub use job::{CycleSummary, ItemFailure, Job, StopSignal};
pub use rename::Renamer;
pub use splitter::Splitter;
