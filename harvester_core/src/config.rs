//! Declarative job configuration
//!
//! A [`JobConfig`] describes a source, an ordered list of processors and a
//! sink. [`JobConfig::build`] validates it and turns it into an assembled
//! [`Job`], so configuration mistakes surface before anything is transferred.

use crate::{
    Result,
    audit::{Auditor, DEFAULT_CHUNK_SIZE},
    chain::{Processor, Source},
    codec::{GzipCompressor, GzipDecompressor, ZipCompressor, ZipExtractor},
    connectors::{Archiver, FileReader, FileWriter, MemorySource, Printer, local::Retirement},
    error::ValidationError,
    hashing::HashAlgorithm,
    job::Job,
    rename::Renamer,
    splitter::Splitter,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Complete description of one transfer job
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct JobConfig {
    #[serde(default)]
    pub job: JobSettings,
    pub source: SourceConfig,
    #[serde(default)]
    pub processors: Vec<ProcessorConfig>,
    pub sink: SinkConfig,
}

/// Scheduling and auditing settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct JobSettings {
    pub interval_seconds: u64,
    pub hash_algorithm: HashAlgorithm,
    pub chunk_size: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
            hash_algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl JobSettings {
    /// Time between cycles
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Auditor shared by every stage of the job
    pub fn auditor(&self) -> Auditor {
        Auditor::new(self.hash_algorithm).with_chunk_size(self.chunk_size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_seconds == 0 {
            return Err(ValidationError::invalid_parameter(
                "job.interval_seconds",
                "must be greater than 0",
            )
            .into());
        }
        if self.chunk_size == 0 {
            return Err(
                ValidationError::invalid_parameter("job.chunk_size", "must be greater than 0")
                    .into(),
            );
        }
        Ok(())
    }
}

/// Where items come from
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Files in a local directory
    Local {
        to_load: PathBuf,
        /// Directory delivered files are moved into
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loaded: Option<PathBuf>,
        /// Delete delivered files instead of moving them
        #[serde(default)]
        delete: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<String>,
        #[serde(default)]
        follow_symlinks: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_files: Option<usize>,
    },
    /// Fixed in-memory items, mostly for trying out a chain
    Memory {
        #[serde(default)]
        items: BTreeMap<String, String>,
    },
}

impl SourceConfig {
    fn retirement(loaded: &Option<PathBuf>, delete: bool) -> Result<Retirement> {
        match (loaded, delete) {
            (Some(loaded), false) => Ok(Retirement::MoveTo(loaded.clone())),
            (None, true) => Ok(Retirement::Delete),
            (Some(_), true) => Err(ValidationError::invalid_configuration(
                "source.loaded and source.delete are mutually exclusive",
            )
            .into()),
            (None, false) => Err(ValidationError::missing_field("source.loaded").into()),
        }
    }

    pub fn build(&self) -> Result<Box<dyn Source>> {
        match self {
            SourceConfig::Local {
                to_load,
                loaded,
                delete,
                filter,
                follow_symlinks,
                max_files,
            } => {
                let mut reader = FileReader::new(to_load, Self::retirement(loaded, *delete)?)
                    .follow_symlinks(*follow_symlinks);
                if let Some(filter) = filter {
                    reader = reader.with_filter(filter)?;
                }
                if let Some(max_files) = max_files {
                    if *max_files == 0 {
                        return Err(ValidationError::invalid_parameter(
                            "source.max_files",
                            "must be greater than 0",
                        )
                        .into());
                    }
                    reader = reader.with_max_files(*max_files);
                }
                Ok(Box::new(reader))
            }
            SourceConfig::Memory { items } => {
                let mut source = MemorySource::new();
                for (name, data) in items {
                    source.insert(name.as_str(), data.as_bytes());
                }
                Ok(Box::new(source))
            }
        }
    }
}

/// One transform stage
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProcessorConfig {
    Gzip {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u32>,
    },
    Gunzip,
    Zip,
    Unzip,
    Rename {
        regex: String,
        format: String,
    },
    /// Replays the artifact through its own chain before continuing
    Split {
        #[serde(default)]
        processors: Vec<ProcessorConfig>,
        sink: SinkConfig,
    },
}

impl ProcessorConfig {
    pub fn build(&self, auditor: Auditor) -> Result<Box<dyn Processor>> {
        let stage: Box<dyn Processor> = match self {
            ProcessorConfig::Gzip { level } => {
                let mut gzip = GzipCompressor::new().with_auditor(auditor);
                if let Some(level) = level {
                    if *level > 9 {
                        return Err(ValidationError::invalid_parameter(
                            "gzip.level",
                            "must be between 0 and 9",
                        )
                        .into());
                    }
                    gzip = gzip.with_level(*level);
                }
                Box::new(gzip)
            }
            ProcessorConfig::Gunzip => Box::new(GzipDecompressor::new().with_auditor(auditor)),
            ProcessorConfig::Zip => Box::new(ZipCompressor::new().with_auditor(auditor)),
            ProcessorConfig::Unzip => Box::new(ZipExtractor::new().with_auditor(auditor)),
            ProcessorConfig::Rename { regex, format } => Box::new(Renamer::new(regex, format)?),
            ProcessorConfig::Split { processors, sink } => {
                let first = link(processors, sink, auditor)?;
                Box::new(Splitter::with_first(first).with_auditor(auditor))
            }
        };
        Ok(stage)
    }
}

/// Where artifacts end up
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Flat local directory
    Local { transmit: PathBuf, to_load: PathBuf },
    /// Local directory tree derived from the artifact name
    Archive {
        transmit: PathBuf,
        archive: PathBuf,
        regex: String,
        format: String,
    },
    /// Standard output
    Stdout,
}

impl SinkConfig {
    pub fn build(&self, auditor: Auditor) -> Result<Box<dyn Processor>> {
        let sink: Box<dyn Processor> = match self {
            SinkConfig::Local { transmit, to_load } => {
                Box::new(FileWriter::new(transmit, to_load).with_auditor(auditor))
            }
            SinkConfig::Archive {
                transmit,
                archive,
                regex,
                format,
            } => Box::new(Archiver::new(transmit, archive, regex, format)?.with_auditor(auditor)),
            SinkConfig::Stdout => Box::new(Printer::new().with_auditor(auditor)),
        };
        Ok(sink)
    }
}

/// Build `processors` in order and terminate them with `sink`
fn link(
    processors: &[ProcessorConfig],
    sink: &SinkConfig,
    auditor: Auditor,
) -> Result<Box<dyn Processor>> {
    let mut head = sink.build(auditor)?;
    for config in processors.iter().rev() {
        let mut stage = config.build(auditor)?;
        stage.set_next(head)?;
        head = stage;
    }
    Ok(head)
}

impl JobConfig {
    /// Check settings that do not need any stage to be built
    pub fn validate(&self) -> Result<()> {
        self.job.validate()
    }

    /// Validate the configuration and assemble the job it describes
    pub fn build(&self) -> Result<Job> {
        self.validate()?;
        let auditor = self.job.auditor();

        let mut job = Job::new(self.source.build()?, self.sink.build(auditor)?);
        for config in &self.processors {
            job.insert(config.build(auditor)?)?;
        }
        job.assemble()?;
        Ok(job)
    }
}
