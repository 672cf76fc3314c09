//! Gzip compression stages

use crate::{
    Error, Result,
    audit::Auditor,
    chain::{Content, NextProcessor, Processor},
    error::TransferError,
};
use flate2::{Compression, GzBuilder, read::MultiGzDecoder};
use log::{debug, info};
use std::io::Cursor;

/// Suffix appended by [`GzipCompressor`] and stripped by [`GzipDecompressor`]
pub const GZIP_SUFFIX: &str = ".gz";

/// Compresses the artifact into a single gzip member named after it
#[derive(Debug)]
pub struct GzipCompressor {
    level: Compression,
    auditor: Auditor,
    next: NextProcessor,
}

impl GzipCompressor {
    /// Stage name used in logs and errors
    pub const NAME: &'static str = "gzip";

    /// Create a compressor with the default compression level
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
            auditor: Auditor::default(),
            next: NextProcessor::new(),
        }
    }

    /// Use a compression level from 0 (store) to 9 (best)
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Compression::new(level.min(9));
        self
    }

    /// Use a specific auditor for the copy into the encoder
    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    fn compress(&self, name: &str, content: &mut Content<'_>) -> Result<Vec<u8>> {
        let mut builder = GzBuilder::new();
        if !name.contains('\0') {
            builder = builder.filename(name);
        }
        let mut encoder = builder.write(Vec::new(), self.level);

        info!("Copying {name} to gzip entry");
        let report = self.auditor.copy(&mut encoder, content)?;
        let compressed = encoder
            .finish()
            .map_err(|e| TransferError::malformed("gzip", e.to_string()))?;

        info!(
            "Gzip writer closed: {} bytes in, {} bytes out",
            report.bytes_written,
            compressed.len()
        );
        Ok(compressed)
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for GzipCompressor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&mut self, name: &str, mut content: Content<'_>) -> Result<()> {
        let compressed = self
            .compress(name, &mut content)
            .map_err(|e| Error::stage(Self::NAME, name, e))?;

        let renamed = format!("{name}{GZIP_SUFFIX}");
        debug!("Renaming context filename {name} -> {renamed}");
        let mut output = Cursor::new(compressed);
        self.next.forward(&renamed, Content::Seekable(&mut output))
    }

    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        self.next.set(Self::NAME, next)
    }
}

/// Decompresses a gzip artifact and strips the `.gz` suffix when present
#[derive(Debug)]
pub struct GzipDecompressor {
    auditor: Auditor,
    next: NextProcessor,
}

impl GzipDecompressor {
    /// Stage name used in logs and errors
    pub const NAME: &'static str = "gunzip";

    /// Create a decompressor
    pub fn new() -> Self {
        Self {
            auditor: Auditor::default(),
            next: NextProcessor::new(),
        }
    }

    /// Use a specific auditor for the copy out of the decoder
    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    fn decompress(&self, content: Content<'_>) -> Result<Vec<u8>> {
        let mut decoder = MultiGzDecoder::new(content);
        let mut buffer = Vec::new();

        self.auditor
            .copy(&mut buffer, &mut decoder)
            .map_err(classify_decode_error)?;
        Ok(buffer)
    }
}

impl Default for GzipDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for GzipDecompressor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&mut self, name: &str, content: Content<'_>) -> Result<()> {
        debug!("Creating a gzip reader for {name}");
        let decompressed = self
            .decompress(content)
            .map_err(|e| Error::stage(Self::NAME, name, e))?;

        let renamed = name.strip_suffix(GZIP_SUFFIX).unwrap_or(name);
        if renamed != name {
            debug!("Removing the {GZIP_SUFFIX} suffix from {name}");
        }

        let mut output = Cursor::new(decompressed);
        self.next.forward(renamed, Content::Seekable(&mut output))
    }

    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        self.next.set(Self::NAME, next)
    }
}

/// Decoder errors surface as I/O errors during the copy; report corrupt
/// input as malformed rather than as a retryable transfer failure.
fn classify_decode_error(err: Error) -> Error {
    match err {
        Error::Transfer(TransferError::Copy { source, .. })
            if matches!(
                source.kind(),
                std::io::ErrorKind::InvalidInput | std::io::ErrorKind::InvalidData
            ) =>
        {
            TransferError::malformed("gzip", source.to_string()).into()
        }
        other => other,
    }
}
