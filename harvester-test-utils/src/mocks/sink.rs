//! Recording sink

use harvester_core::{Content, Error, Processor, Result, audit::Auditor};
use std::sync::{Arc, Mutex, MutexGuard};

/// One artifact as the sink received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub name: String,
    pub data: Vec<u8>,
    /// Digest reported by the audited copy into the sink
    pub digest: String,
}

/// Shared view of everything a [`RecordingSink`] received
#[derive(Debug, Clone, Default)]
pub struct Deliveries(Arc<Mutex<Vec<Delivery>>>);

impl Deliveries {
    fn lock(&self) -> MutexGuard<'_, Vec<Delivery>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every delivery so far, in arrival order
    pub fn all(&self) -> Vec<Delivery> {
        self.lock().clone()
    }

    /// Names of every delivery so far
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Sink that keeps every artifact in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    auditor: Auditor,
    deliveries: Deliveries,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with a specific auditor, e.g. to get another digest algorithm
    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    /// Handle that stays valid after the sink is moved into a chain
    pub fn deliveries(&self) -> Deliveries {
        self.deliveries.clone()
    }
}

impl Processor for RecordingSink {
    fn name(&self) -> &str {
        "recording-sink"
    }

    fn process(&mut self, name: &str, mut content: Content<'_>) -> Result<()> {
        let mut data = Vec::new();
        let report = self
            .auditor
            .copy(&mut data, &mut content)
            .map_err(|e| Error::stage("recording-sink", name, e))?;

        self.deliveries.lock().push(Delivery {
            name: name.to_string(),
            data,
            digest: report.digest,
        });
        Ok(())
    }
}
