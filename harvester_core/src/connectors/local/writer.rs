//! Local directory sinks

use super::deliver;
use crate::{
    Error, Result,
    audit::Auditor,
    chain::{Content, Processor},
    error::IoError,
    filename::{FilenameTemplate, validate_plain_name},
};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Delivers artifacts into a flat `to_load` directory
#[derive(Debug)]
pub struct FileWriter {
    transmit: PathBuf,
    to_load: PathBuf,
    auditor: Auditor,
}

impl FileWriter {
    /// Stage name used in logs and errors
    pub const NAME: &'static str = "local-writer";

    /// Write through `transmit` and deliver into `to_load`
    pub fn new(transmit: impl Into<PathBuf>, to_load: impl Into<PathBuf>) -> Self {
        Self {
            transmit: transmit.into(),
            to_load: to_load.into(),
            auditor: Auditor::default(),
        }
    }

    /// Use a specific auditor for the copy into the transmit file
    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    /// Directory finished files land in
    pub fn to_load(&self) -> &Path {
        &self.to_load
    }

    fn write(&self, name: &str, content: &mut Content<'_>) -> Result<()> {
        validate_plain_name(name)?;
        let transmit_path = self.transmit.join(name);
        let final_path = self.to_load.join(name);

        let report = deliver(content, &transmit_path, &final_path, &self.auditor)?;
        info!(
            "Delivered {name}: {} bytes, {} {}",
            report.bytes_written, report.algorithm, report.digest
        );
        Ok(())
    }
}

impl Processor for FileWriter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&mut self, name: &str, mut content: Content<'_>) -> Result<()> {
        self.write(name, &mut content)
            .map_err(|e| Error::stage(Self::NAME, name, e))
    }
}

/// Delivers artifacts into a directory tree derived from their names
///
/// The subdirectory under `archive_root` comes from a regex template applied
/// to the artifact name, e.g. regex `^(\d{4})(\d{2})` with template `$1/$2`
/// files `202405_sales.csv` under `2024/05/`. A name the regex does not match
/// goes straight into `archive_root`.
#[derive(Debug)]
pub struct Archiver {
    transmit: PathBuf,
    archive_root: PathBuf,
    template: FilenameTemplate,
    auditor: Auditor,
}

impl Archiver {
    /// Stage name used in logs and errors
    pub const NAME: &'static str = "archiver";

    /// Create an archiver; an invalid regex fails here
    pub fn new(
        transmit: impl Into<PathBuf>,
        archive_root: impl Into<PathBuf>,
        regex: &str,
        template: &str,
    ) -> Result<Self> {
        Ok(Self {
            transmit: transmit.into(),
            archive_root: archive_root.into(),
            template: FilenameTemplate::new(regex, template)?,
            auditor: Auditor::default(),
        })
    }

    /// Use a specific auditor for the copy into the transmit file
    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    /// Directory the archive tree starts at
    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    fn archive(&self, name: &str, content: &mut Content<'_>) -> Result<()> {
        validate_plain_name(name)?;
        let subpath = self.template.archive_subpath(name)?;
        let directory = self.archive_root.join(&subpath);

        debug!("Creating archive directory {}", directory.display());
        fs::create_dir_all(&directory)
            .map_err(|e| IoError::at("create archive directory", &directory, e))?;

        let transmit_path = self.transmit.join(name);
        let final_path = directory.join(name);
        let report = deliver(content, &transmit_path, &final_path, &self.auditor)?;
        info!(
            "Archived {name} under {}: {} bytes, {} {}",
            directory.display(),
            report.bytes_written,
            report.algorithm,
            report.digest
        );
        Ok(())
    }
}

impl Processor for Archiver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&mut self, name: &str, mut content: Content<'_>) -> Result<()> {
        self.archive(name, &mut content)
            .map_err(|e| Error::stage(Self::NAME, name, e))
    }
}
