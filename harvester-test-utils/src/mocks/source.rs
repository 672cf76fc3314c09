//! Scripted source

use harvester_core::{
    Content, NextProcessor, Processor, Result, Source,
    error::{IoError, TransferError},
};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// In-memory source whose listing and retirement can be made to fail
#[derive(Debug, Default)]
pub struct ScriptedSource {
    items: BTreeMap<String, Vec<u8>>,
    fail_listing: bool,
    fail_retirement: bool,
    retired: Arc<Mutex<Vec<String>>>,
    next: NextProcessor,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, name: &str, data: &[u8]) -> Self {
        self.items.insert(name.to_string(), data.to_vec());
        self
    }

    /// Make every `list` call fail
    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Make retirement fail after a successful chain run
    pub fn failing_retirement(mut self) -> Self {
        self.fail_retirement = true;
        self
    }

    /// Names retired so far, shared with the caller
    pub fn retired(&self) -> Arc<Mutex<Vec<String>>> {
        self.retired.clone()
    }
}

impl Source for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn list(&mut self) -> Result<Vec<String>> {
        if self.fail_listing {
            return Err(IoError::file_not_found(Path::new("/scripted/to_load")).into());
        }
        Ok(self.items.keys().cloned().collect())
    }

    fn process(&mut self, name: &str) -> Result<()> {
        let data = self
            .items
            .get(name)
            .cloned()
            .ok_or_else(|| IoError::file_not_found(Path::new(name)))?;

        let mut stream = Cursor::new(data);
        self.next.forward(name, Content::Seekable(&mut stream))?;

        if self.fail_retirement {
            return Err(TransferError::retirement(
                Path::new(name),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            )
            .into());
        }

        self.items.remove(name);
        if let Ok(mut retired) = self.retired.lock() {
            retired.push(name.to_string());
        }
        Ok(())
    }

    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        self.next.set("scripted", next)
    }
}
