//! Processor chain contract
//!
//! A chain is a singly linked list of stages. Each stage owns its downstream
//! stage, receives `(name, content)`, and decides what `(name, content)` flows
//! onward. The last stage is the sink. A [`Source`] sits in front of the chain,
//! opens items and retires them once the whole chain has succeeded.

use crate::{Result, audit::Auditor, error::ValidationError};
use log::debug;
use std::fmt::Debug;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// A readable stream that can also be rewound
pub trait SeekableStream: Read + Seek {}

impl<T: Read + Seek + ?Sized> SeekableStream for T {}

/// The byte stream of an artifact as seen by one stage
///
/// The stream is borrowed: whoever opened it owns it. A stage either passes
/// the borrow onward or substitutes a stream it owns itself.
pub enum Content<'a> {
    /// Forward-only stream
    Stream(&'a mut dyn Read),
    /// Stream supporting random access
    Seekable(&'a mut dyn SeekableStream),
}

impl<'a> Content<'a> {
    /// Borrow the same stream again for a shorter lifetime
    pub fn reborrow(&mut self) -> Content<'_> {
        match self {
            Content::Stream(reader) => Content::Stream(&mut **reader),
            Content::Seekable(reader) => Content::Seekable(&mut **reader),
        }
    }

    /// Whether the stream supports seeking
    pub fn is_seekable(&self) -> bool {
        matches!(self, Content::Seekable(_))
    }

    /// Access the stream as seekable, if it is
    pub fn as_seekable(&mut self) -> Option<&mut dyn SeekableStream> {
        match self {
            Content::Seekable(reader) => Some(&mut **reader),
            Content::Stream(_) => None,
        }
    }

    /// Read the remaining bytes into memory with an audited copy
    ///
    /// Stages that need random access call this; the artifact must then fit
    /// in memory.
    pub fn materialize(&mut self, auditor: &Auditor) -> Result<Cursor<Vec<u8>>> {
        let mut buffer = Vec::new();
        auditor.copy(&mut buffer, self)?;
        Ok(Cursor::new(buffer))
    }
}

impl Read for Content<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Content::Stream(reader) => reader.read(buf),
            Content::Seekable(reader) => reader.read(buf),
        }
    }
}

impl Debug for Content<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Content::Stream(_) => f.write_str("Content::Stream"),
            Content::Seekable(_) => f.write_str("Content::Seekable"),
        }
    }
}

/// Core trait for chain stages
///
/// Transform stages hold a [`NextProcessor`] and forward to it on success.
/// Sinks keep the default [`Processor::set_next`], which refuses a downstream
/// stage.
pub trait Processor: Send + Debug {
    /// Short stage name used in logs and errors
    fn name(&self) -> &str;

    /// Handle one artifact and, on success, pass the result downstream
    fn process(&mut self, name: &str, content: Content<'_>) -> Result<()>;

    /// Link the downstream stage; allowed once per chain
    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        let _ = next;
        Err(ValidationError::terminal_stage(self.name()).into())
    }
}

/// The front of a chain: enumerates items and feeds them in
pub trait Source: Send + Debug {
    /// Short source name used in logs and errors
    fn name(&self) -> &str;

    /// Enumerate the items currently available
    fn list(&mut self) -> Result<Vec<String>>;

    /// Open one item, run it through the chain and retire it on success
    ///
    /// If the chain fails the item must be left in place so a later cycle can
    /// retry it.
    fn process(&mut self, name: &str) -> Result<()>;

    /// Link the head of the chain; allowed once
    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()>;
}

/// Pass-through helper holding the downstream link
///
/// Stages delegate "forward to next" here. With no next stage, forwarding
/// succeeds without doing anything.
#[derive(Debug, Default)]
pub struct NextProcessor {
    next: Option<Box<dyn Processor>>,
}

impl NextProcessor {
    /// Create an empty link
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the downstream stage, refusing to replace an existing one
    ///
    /// `owner` names the stage holding this link, for the error message.
    pub fn set(&mut self, owner: &str, next: Box<dyn Processor>) -> Result<()> {
        if self.next.is_some() {
            return Err(ValidationError::next_already_set(owner).into());
        }
        debug!("Linking {owner} -> {}", next.name());
        self.next = Some(next);
        Ok(())
    }

    /// Whether a downstream stage is linked
    pub fn is_linked(&self) -> bool {
        self.next.is_some()
    }

    /// Name of the downstream stage, if any
    pub fn next_name(&self) -> Option<&str> {
        self.next.as_deref().map(|next| next.name())
    }

    /// Call the downstream stage, if any
    pub fn forward(&mut self, name: &str, content: Content<'_>) -> Result<()> {
        match self.next.as_mut() {
            Some(next) => next.process(name, content),
            None => Ok(()),
        }
    }
}

/// Seek a stream back to its first byte
pub(crate) fn rewind(stream: &mut dyn SeekableStream) -> io::Result<()> {
    stream.seek(SeekFrom::Start(0)).map(|_| ())
}
