//! Single-entry zip stages

use crate::{
    Error, Result,
    audit::Auditor,
    chain::{Content, NextProcessor, Processor},
    error::TransferError,
};
use ::zip::{
    CompressionMethod, ZipArchive, ZipWriter, result::ZipError, write::SimpleFileOptions,
};
use log::{debug, info};
use std::io::Cursor;

/// Suffix appended by [`ZipCompressor`]
pub const ZIP_SUFFIX: &str = ".zip";

fn malformed(err: ZipError) -> TransferError {
    TransferError::malformed("zip", err.to_string())
}

/// Wraps the artifact in a zip archive holding one deflated entry
#[derive(Debug)]
pub struct ZipCompressor {
    auditor: Auditor,
    next: NextProcessor,
}

impl ZipCompressor {
    /// Stage name used in logs and errors
    pub const NAME: &'static str = "zip";

    /// Create a compressor
    pub fn new() -> Self {
        Self {
            auditor: Auditor::default(),
            next: NextProcessor::new(),
        }
    }

    /// Use a specific auditor for the copy into the archive entry
    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    fn compress(&self, name: &str, content: &mut Content<'_>) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        debug!("Creating a zip entry for {name}");
        writer.start_file(name, options).map_err(malformed)?;

        let report = self.auditor.copy(&mut writer, content)?;
        let archive = writer.finish().map_err(malformed)?.into_inner();

        info!(
            "Zip archive closed: {} bytes in, {} bytes out",
            report.bytes_written,
            archive.len()
        );
        Ok(archive)
    }
}

impl Default for ZipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for ZipCompressor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&mut self, name: &str, mut content: Content<'_>) -> Result<()> {
        let archive = self
            .compress(name, &mut content)
            .map_err(|e| Error::stage(Self::NAME, name, e))?;

        let renamed = format!("{name}{ZIP_SUFFIX}");
        debug!("Renaming context filename {name} -> {renamed}");
        let mut output = Cursor::new(archive);
        self.next.forward(&renamed, Content::Seekable(&mut output))
    }

    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        self.next.set(Self::NAME, next)
    }
}

/// Extracts the single file inside a zip archive
///
/// The archive is read into memory first because the zip reader needs its
/// total length. The artifact takes the name of the archived entry. Archives
/// with zero or several entries, or whose entry is a directory, fail the item
/// permanently.
#[derive(Debug)]
pub struct ZipExtractor {
    auditor: Auditor,
    next: NextProcessor,
}

impl ZipExtractor {
    /// Stage name used in logs and errors
    pub const NAME: &'static str = "unzip";

    /// Create an extractor
    pub fn new() -> Self {
        Self {
            auditor: Auditor::default(),
            next: NextProcessor::new(),
        }
    }

    /// Use a specific auditor for buffering and extraction
    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    fn extract(&self, content: &mut Content<'_>) -> Result<(String, Vec<u8>)> {
        debug!("Copying the archive into a buffer");
        let buffered = content.materialize(&self.auditor)?;

        let mut archive = ZipArchive::new(buffered).map_err(malformed)?;
        info!("{} files found in the zip file", archive.len());
        if archive.len() != 1 {
            return Err(TransferError::unexpected_entry_count(1, archive.len()).into());
        }

        let mut entry = archive.by_index(0).map_err(malformed)?;
        let entry_name = entry.name().to_string();
        if entry.is_dir() {
            return Err(TransferError::directory_entry(&entry_name).into());
        }

        debug!("Reading {entry_name} into memory");
        let mut data = Vec::new();
        self.auditor.copy(&mut data, &mut entry)?;
        Ok((entry_name, data))
    }
}

impl Default for ZipExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for ZipExtractor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&mut self, name: &str, mut content: Content<'_>) -> Result<()> {
        let (entry_name, data) = self
            .extract(&mut content)
            .map_err(|e| Error::stage(Self::NAME, name, e))?;

        debug!("Replacing the context filename {name} with {entry_name}");
        let mut output = Cursor::new(data);
        self.next.forward(&entry_name, Content::Seekable(&mut output))
    }

    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        self.next.set(Self::NAME, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Capture {
        seen: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    }

    impl Processor for Capture {
        fn name(&self) -> &str {
            "capture"
        }

        fn process(&mut self, name: &str, mut content: Content<'_>) -> Result<()> {
            let mut data = Vec::new();
            content.read_to_end(&mut data)?;
            self.seen.lock().unwrap().push((name.to_string(), data));
            Ok(())
        }
    }

    fn extract(data: Vec<u8>) -> (Result<()>, Vec<(String, Vec<u8>)>) {
        let capture = Capture::default();
        let seen = capture.seen.clone();
        let mut stage = ZipExtractor::new();
        stage.set_next(Box::new(capture)).unwrap();

        let mut input = Cursor::new(data);
        let result = stage.process("in.zip", Content::Seekable(&mut input));
        let seen = seen.lock().unwrap().clone();
        (result, seen)
    }

    fn archive_with(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            match data {
                Some(data) => {
                    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                    writer.write_all(data).unwrap();
                }
                None => writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap(),
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_round_trip_restores_name() {
        let capture = Capture::default();
        let seen = capture.seen.clone();
        let mut zipper = ZipCompressor::new();
        zipper.set_next(Box::new(capture)).unwrap();

        let mut input: &[u8] = b"hello zip";
        zipper
            .process("a.txt", Content::Stream(&mut input))
            .unwrap();
        let (zipped_name, zipped) = seen.lock().unwrap().pop().unwrap();
        assert_eq!(zipped_name, "a.txt.zip");

        let (result, seen) = extract(zipped);
        result.unwrap();
        assert_eq!(seen, vec![("a.txt".to_string(), b"hello zip".to_vec())]);
    }

    #[test]
    fn test_empty_archive_fails_permanently() {
        let (result, seen) = extract(archive_with(&[]));
        let err = result.unwrap_err();

        assert!(seen.is_empty());
        assert!(!err.is_retryable());
        assert!(matches!(
            err.root(),
            Error::Transfer(TransferError::UnexpectedEntryCount {
                expected: 1,
                found: 0
            })
        ));
    }

    #[test]
    fn test_multiple_entries_fail() {
        let archive = archive_with(&[("a", Some(&b"1"[..])), ("b", Some(&b"2"[..]))]);
        let (result, seen) = extract(archive);

        assert!(seen.is_empty());
        assert!(matches!(
            result.unwrap_err().root(),
            Error::Transfer(TransferError::UnexpectedEntryCount { found: 2, .. })
        ));
    }

    #[test]
    fn test_directory_entry_fails() {
        let (result, seen) = extract(archive_with(&[("folder/", None)]));

        assert!(seen.is_empty());
        assert!(matches!(
            result.unwrap_err().root(),
            Error::Transfer(TransferError::DirectoryEntry { .. })
        ));
    }

    #[test]
    fn test_not_a_zip_is_malformed() {
        let (result, _) = extract(b"plain text".to_vec());
        let err = result.unwrap_err();

        assert!(!err.is_retryable());
        assert!(err.to_string().contains("unzip"));
    }
}
