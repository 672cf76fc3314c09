//! Stage that always fails

use harvester_core::{Content, Error, NextProcessor, Processor, Result, error::ValidationError};
use std::io::Read;

/// Reads part of the artifact, then fails without forwarding it
#[derive(Debug)]
pub struct FailingStage {
    reason: String,
    consume: usize,
    next: NextProcessor,
}

impl FailingStage {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
            consume: 0,
            next: NextProcessor::new(),
        }
    }

    /// Read up to `bytes` bytes of the artifact before failing
    pub fn consuming(mut self, bytes: usize) -> Self {
        self.consume = bytes;
        self
    }
}

impl Processor for FailingStage {
    fn name(&self) -> &str {
        "failing-stage"
    }

    fn process(&mut self, name: &str, content: Content<'_>) -> Result<()> {
        let mut scratch = Vec::new();
        content.take(self.consume as u64).read_to_end(&mut scratch)?;

        Err(Error::stage(
            "failing-stage",
            name,
            ValidationError::invalid_configuration(&self.reason),
        ))
    }

    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        self.next.set("failing-stage", next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingSink;

    #[test]
    fn test_never_forwards_to_linked_stage() {
        let sink = RecordingSink::new();
        let deliveries = sink.deliveries();
        let mut stage = FailingStage::new("offline").consuming(1);
        stage.set_next(Box::new(sink)).unwrap();

        let mut input: &[u8] = b"abc";
        let err = stage
            .process("a.txt", Content::Stream(&mut input))
            .unwrap_err();

        assert!(err.to_string().contains("offline"));
        assert_eq!(input, b"bc");
        assert!(deliveries.is_empty());
    }

    #[test]
    fn test_second_next_stage_is_rejected() {
        let mut stage = FailingStage::new("offline");
        stage.set_next(Box::new(RecordingSink::new())).unwrap();

        assert!(stage.set_next(Box::new(RecordingSink::new())).is_err());
    }
}
