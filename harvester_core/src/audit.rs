//! Audited copy: the byte mover every stage and connector goes through
//!
//! An audited copy moves a whole stream into a destination while hashing
//! exactly the bytes the destination accepted, in the order it accepted them,
//! and timing the transfer. The resulting [`AuditReport`] is logged and
//! handed back to the caller; it never influences control flow.

use crate::{Result, error::TransferError, hashing::HashAlgorithm, hashing::StreamingHasher};
use log::{debug, info};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

/// Default copy buffer size (64KB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Elapsed times below this are clamped when computing throughput
pub const MIN_ELAPSED: Duration = Duration::from_micros(1);

/// Outcome of one audited copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Bytes accepted by the destination
    pub bytes_written: u64,
    /// Wall-clock duration of the copy
    pub elapsed: Duration,
    /// Algorithm used for `digest`
    pub algorithm: HashAlgorithm,
    /// Hex-encoded content hash
    pub digest: String,
}

impl AuditReport {
    /// Throughput in bytes per second
    pub fn bytes_per_second(&self) -> f64 {
        self.bytes_written as f64 / self.elapsed.max(MIN_ELAPSED).as_secs_f64()
    }

    /// Throughput in MB/s (1 MB = 1048576 bytes)
    pub fn megabytes_per_second(&self) -> f64 {
        self.bytes_per_second() / (1024.0 * 1024.0)
    }
}

/// Configuration for audited copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Auditor {
    /// Hash algorithm used for every copy
    pub algorithm: HashAlgorithm,
    /// Size of the intermediate read buffer
    pub chunk_size: usize,
}

impl Default for Auditor {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Auditor {
    /// Create an auditor using the given algorithm and the default chunk size
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Use a different read buffer size (clamped to at least one byte)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Copy `src` into `dst` until end of stream, hashing and timing the transfer
    ///
    /// On failure the returned [`TransferError::Copy`] carries the number of
    /// bytes `dst` accepted before the error. Nothing is rolled back.
    pub fn copy<W, R>(&self, dst: &mut W, src: &mut R) -> Result<AuditReport>
    where
        W: Write + ?Sized,
        R: Read + ?Sized,
    {
        let mut writer = AuditWriter {
            inner: dst,
            hasher: self.algorithm.create_hasher(),
            written: 0,
        };
        let mut buffer = vec![0u8; self.chunk_size.max(1)];
        let start = Instant::now();

        debug!("Copying data with {} byte chunks", buffer.len());
        loop {
            let bytes_read = match src.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransferError::copy_failed(writer.written, e).into()),
            };

            if let Err(e) = writer.write_all(&buffer[..bytes_read]) {
                return Err(TransferError::copy_failed(writer.written, e).into());
            }
        }

        if let Err(e) = writer.flush() {
            return Err(TransferError::copy_failed(writer.written, e).into());
        }

        let report = AuditReport {
            bytes_written: writer.written,
            elapsed: start.elapsed(),
            algorithm: self.algorithm,
            digest: writer.hasher.finalize(),
        };

        info!(
            "Copy complete: written={} elapsed={:?} megabytespersecond={:.2} {}hash={}",
            report.bytes_written,
            report.elapsed,
            report.megabytes_per_second(),
            report.algorithm,
            report.digest
        );

        Ok(report)
    }
}

/// Copy `src` into `dst` with the default auditor (SHA-1, 64KB chunks)
pub fn audited_copy<W, R>(dst: &mut W, src: &mut R) -> Result<AuditReport>
where
    W: Write + ?Sized,
    R: Read + ?Sized,
{
    Auditor::default().copy(dst, src)
}

/// Writer adapter that hashes only what the destination accepted
struct AuditWriter<'a, W: Write + ?Sized> {
    inner: &'a mut W,
    hasher: Box<dyn StreamingHasher>,
    written: u64,
}

impl<W: Write + ?Sized> Write for AuditWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that yields some bytes, then fails
    struct BrokenReader {
        remaining: usize,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            let n = buf.len().min(self.remaining);
            buf[..n].fill(b'x');
            self.remaining -= n;
            Ok(n)
        }
    }

    /// Writer that accepts a limited number of bytes, then fails
    struct FullWriter {
        capacity: usize,
        data: Vec<u8>,
    }

    impl Write for FullWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.capacity - self.data.len();
            if room == 0 {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"));
            }
            let n = buf.len().min(room);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_copy_hello() {
        let mut dst = Vec::new();
        let report = audited_copy(&mut dst, &mut Cursor::new(b"hello".to_vec())).unwrap();

        assert_eq!(dst, b"hello");
        assert_eq!(report.bytes_written, 5);
        assert_eq!(report.algorithm, HashAlgorithm::Sha1);
        assert_eq!(report.digest, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    }

    #[test]
    fn test_empty_source() {
        let mut dst = Vec::new();
        let report = audited_copy(&mut dst, &mut io::empty()).unwrap();

        assert!(dst.is_empty());
        assert_eq!(report.bytes_written, 0);
        assert_eq!(report.digest, HashAlgorithm::Sha1.hash_bytes(b""));
        assert_eq!(report.bytes_per_second(), 0.0);
    }

    #[test]
    fn test_read_failure_reports_written_bytes() {
        let mut dst = Vec::new();
        let auditor = Auditor::default().with_chunk_size(10);
        let err = auditor
            .copy(&mut dst, &mut BrokenReader { remaining: 25 })
            .unwrap_err();

        assert_eq!(dst.len(), 25);
        match err {
            crate::Error::Transfer(TransferError::Copy { written, .. }) => assert_eq!(written, 25),
            other => panic!("Expected copy error, got {other:?}"),
        }
    }

    #[test]
    fn test_write_failure_reports_accepted_bytes() {
        let mut dst = FullWriter {
            capacity: 7,
            data: Vec::new(),
        };
        let err = audited_copy(&mut dst, &mut Cursor::new(vec![1u8; 20])).unwrap_err();

        assert!(err.to_string().contains("after 7 bytes"));
        assert_eq!(dst.data.len(), 7);
    }

    #[test]
    fn test_zero_duration_throughput_is_finite() {
        let report = AuditReport {
            bytes_written: 1024,
            elapsed: Duration::ZERO,
            algorithm: HashAlgorithm::Sha1,
            digest: String::new(),
        };

        let throughput = report.bytes_per_second();
        assert!(throughput.is_finite());
        assert_eq!(throughput, 1024.0 / MIN_ELAPSED.as_secs_f64());
    }

    #[test]
    fn test_chunk_size_is_clamped() {
        let auditor = Auditor::default().with_chunk_size(0);
        assert_eq!(auditor.chunk_size, 1);

        let mut dst = Vec::new();
        let report = auditor
            .copy(&mut dst, &mut Cursor::new(b"abc".to_vec()))
            .unwrap();
        assert_eq!(report.bytes_written, 3);
    }

    #[test]
    fn test_alternative_algorithm() {
        let mut dst = Vec::new();
        let report = Auditor::new(HashAlgorithm::Crc32)
            .copy(&mut dst, &mut Cursor::new(b"hello".to_vec()))
            .unwrap();

        assert_eq!(report.digest, "3610a686");
    }
}
