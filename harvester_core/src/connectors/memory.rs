//! In-memory source

use crate::{
    Result,
    chain::{Content, NextProcessor, Processor, Source},
    error::{IoError, ValidationError},
};
use log::debug;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

/// Serves named byte buffers; an item is removed once its chain succeeds
#[derive(Debug, Default)]
pub struct MemorySource {
    items: BTreeMap<String, Vec<u8>>,
    next: NextProcessor,
}

impl MemorySource {
    /// Source name used in logs and errors
    pub const NAME: &'static str = "memory";

    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an item
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.items.insert(name.into(), data.into());
    }

    /// Builder form of [`MemorySource::insert`]
    pub fn with_item(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    /// Items not yet retired
    pub fn remaining(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Number of items not yet retired
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether every item has been retired
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Source for MemorySource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn list(&mut self) -> Result<Vec<String>> {
        Ok(self.items.keys().cloned().collect())
    }

    fn process(&mut self, name: &str) -> Result<()> {
        if !self.next.is_linked() {
            return Err(ValidationError::invalid_configuration(
                "memory source has no chain to deliver to",
            )
            .into());
        }

        let data = self
            .items
            .get(name)
            .ok_or_else(|| IoError::file_not_found(Path::new(name)))?;

        let mut stream = Cursor::new(data.as_slice());
        self.next.forward(name, Content::Seekable(&mut stream))?;

        debug!("Retiring in-memory item {name}");
        self.items.remove(name);
        Ok(())
    }

    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        self.next.set(Self::NAME, next)
    }
}

impl From<MemorySource> for Box<dyn Source> {
    fn from(source: MemorySource) -> Self {
        Box::new(source)
    }
}
