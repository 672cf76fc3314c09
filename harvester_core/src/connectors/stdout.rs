//! Standard output sink

use crate::{
    Error, Result,
    audit::Auditor,
    chain::{Content, Processor},
};
use log::info;
use std::fmt;
use std::io::{self, Write};

/// Writes every artifact to standard output, or to another writer
pub struct Printer {
    out: Box<dyn Write + Send>,
    auditor: Auditor,
}

impl Printer {
    /// Stage name used in logs and errors
    pub const NAME: &'static str = "stdout";

    /// Print to standard output
    pub fn new() -> Self {
        Self::to_writer(Box::new(io::stdout()))
    }

    /// Print to `out` instead of standard output
    pub fn to_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            auditor: Auditor::default(),
        }
    }

    /// Use a specific auditor for the copy
    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Printer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Printer")
            .field("auditor", &self.auditor)
            .finish_non_exhaustive()
    }
}

impl Processor for Printer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&mut self, name: &str, mut content: Content<'_>) -> Result<()> {
        let report = self
            .auditor
            .copy(&mut *self.out, &mut content)
            .map_err(|e| Error::stage(Self::NAME, name, e))?;
        info!("Printed {name}: {} bytes", report.bytes_written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_printer_writes_every_artifact() {
        let out = Shared::default();
        let mut printer = Printer::to_writer(Box::new(out.clone()));

        let mut first: &[u8] = b"one\n";
        let mut second: &[u8] = b"two\n";
        printer.process("1", Content::Stream(&mut first)).unwrap();
        printer.process("2", Content::Stream(&mut second)).unwrap();

        assert_eq!(out.0.lock().unwrap().as_slice(), b"one\ntwo\n");
    }

    #[test]
    fn test_printer_is_a_sink() {
        let mut printer = Printer::to_writer(Box::new(io::sink()));
        assert!(printer.set_next(Box::new(Printer::to_writer(Box::new(io::sink())))).is_err());
    }
}
