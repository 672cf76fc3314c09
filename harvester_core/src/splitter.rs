//! Splitter stage: replays one artifact through two sub-chains

use crate::{
    Error, Result,
    audit::Auditor,
    chain::{self, Content, NextProcessor, Processor},
    error::{TransferError, ValidationError},
};
use log::{debug, info};

/// Sends the same artifact through a first sub-chain, then through its own
/// next link
///
/// The content must be seekable so it can be rewound between the two runs;
/// a forward-only stream is buffered in memory first. Stages in the first
/// sub-chain only ever borrow the stream, so they cannot close it.
#[derive(Debug)]
pub struct Splitter {
    first: Option<Box<dyn Processor>>,
    next: NextProcessor,
    auditor: Auditor,
}

impl Splitter {
    /// Stage name used in logs and errors
    pub const NAME: &'static str = "split";

    /// Create a splitter without a first sub-chain
    pub fn new() -> Self {
        Self {
            first: None,
            next: NextProcessor::new(),
            auditor: Auditor::default(),
        }
    }

    /// Create a splitter that runs `first` before its next link
    pub fn with_first(first: Box<dyn Processor>) -> Self {
        Self {
            first: Some(first),
            ..Self::new()
        }
    }

    /// Use a specific auditor when buffering forward-only input
    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    /// Set the first sub-chain; allowed once
    pub fn set_first(&mut self, first: Box<dyn Processor>) -> Result<()> {
        if self.first.is_some() {
            return Err(ValidationError::invalid_configuration(
                "splitter already has a first sub-chain",
            )
            .into());
        }
        self.first = Some(first);
        Ok(())
    }

    fn replay(
        first: &mut dyn Processor,
        next: &mut NextProcessor,
        name: &str,
        stream: &mut dyn chain::SeekableStream,
    ) -> Result<()> {
        let original_name = name.to_string();

        info!("Calling the first processor ({}) for {name}", first.name());
        first
            .process(name, Content::Seekable(&mut *stream))
            .map_err(|e| Error::stage(Self::NAME, &original_name, e))?;

        debug!("Seeking to the beginning of {original_name}");
        chain::rewind(stream).map_err(|e| {
            Error::stage(Self::NAME, &original_name, TransferError::rewind(e))
        })?;

        info!("Calling the second processor for {original_name}");
        next.forward(&original_name, Content::Seekable(stream))?;

        info!("Splitter done for {original_name}");
        Ok(())
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Splitter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&mut self, name: &str, mut content: Content<'_>) -> Result<()> {
        let Some(first) = self.first.as_deref_mut() else {
            return Err(Error::stage(
                Self::NAME,
                name,
                ValidationError::missing_field("split.processors"),
            ));
        };

        match content.as_seekable() {
            Some(stream) => Self::replay(first, &mut self.next, name, stream),
            None => {
                debug!("Buffering {name} so it can be replayed");
                let mut buffered = content
                    .materialize(&self.auditor)
                    .map_err(|e| Error::stage(Self::NAME, name, e))?;
                Self::replay(first, &mut self.next, name, &mut buffered)
            }
        }
    }

    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        self.next.set(Self::NAME, next)
    }
}
