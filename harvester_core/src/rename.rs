//! Renaming stage

use crate::{
    Error, Result,
    chain::{Content, NextProcessor, Processor},
    filename::FilenameTemplate,
};
use log::debug;

/// Rewrites the artifact name with a regex template
///
/// Example: regex `(\d{4})(\d{2})(\d{2})` with format `$1-$2-$3.txt` turns
/// `20240501.dat` into `2024-05-01.txt`. A name the regex does not match fails
/// the item.
#[derive(Debug)]
pub struct Renamer {
    template: FilenameTemplate,
    next: NextProcessor,
}

impl Renamer {
    /// Stage name used in logs and errors
    pub const NAME: &'static str = "rename";

    /// Create a renamer; an invalid regex fails here rather than per item
    pub fn new(regex: &str, format: &str) -> Result<Self> {
        Ok(Self {
            template: FilenameTemplate::new(regex, format)?,
            next: NextProcessor::new(),
        })
    }
}

impl Processor for Renamer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&mut self, name: &str, content: Content<'_>) -> Result<()> {
        let renamed = self
            .template
            .rename(name)
            .map_err(|e| Error::stage(Self::NAME, name, e))?;

        debug!("Renaming context filename {name} -> {renamed}");
        self.next.forward(&renamed, content)
    }

    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        self.next.set(Self::NAME, next)
    }
}
