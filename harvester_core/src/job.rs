//! Transfer job: periodic listing and sequential per-item transfer
//!
//! A job owns one [`Source`], an ordered list of transform stages and one sink.
//! Assembly links them into a single chain owned by the source. Each cycle
//! lists the source and pushes every listed item through the chain, one at a
//! time. A failed listing aborts the cycle; a failed item is logged and the
//! cycle moves on to the next one.

use crate::{
    Result,
    chain::{Processor, Source},
    error::{TransferError, ValidationError},
};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest single sleep while waiting for the next cycle
const STOP_POLL: Duration = Duration::from_millis(100);

/// Shared flag asking a running job to stop between items
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Create a signal that has not been raised
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the job to stop after the item in flight
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One item that failed during a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Item name as listed by the source
    pub name: String,
    /// Rendered error
    pub error: String,
    /// Whether a later cycle could succeed
    pub retryable: bool,
    /// Whether the bytes were moved but a cleanup step failed afterwards
    pub cleanup: bool,
}

/// Outcome of one listing and transfer pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    /// Number of items the source listed
    pub listed: usize,
    /// Items delivered and retired
    pub delivered: Vec<String>,
    /// Items that failed
    pub failed: Vec<ItemFailure>,
    /// Whether the cycle stopped early on request
    pub interrupted: bool,
}

impl CycleSummary {
    /// Whether every listed item was delivered
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }
}

enum Assembly {
    Pending {
        transforms: Vec<Box<dyn Processor>>,
        sink: Box<dyn Processor>,
    },
    Assembled,
    Failed,
}

/// A source, its transforms and a sink, run on a fixed interval
pub struct Job {
    source: Box<dyn Source>,
    assembly: Assembly,
    stage_names: Vec<String>,
}

impl Job {
    /// Create a job delivering from `source` straight into `sink`
    pub fn new(source: Box<dyn Source>, sink: Box<dyn Processor>) -> Self {
        Self {
            source,
            assembly: Assembly::Pending {
                transforms: Vec::new(),
                sink,
            },
            stage_names: Vec::new(),
        }
    }

    /// Append a transform stage; stages run in insertion order
    pub fn insert(&mut self, processor: Box<dyn Processor>) -> Result<()> {
        match &mut self.assembly {
            Assembly::Pending { transforms, .. } => {
                debug!("Inserting stage {}", processor.name());
                transforms.push(processor);
                Ok(())
            }
            Assembly::Assembled | Assembly::Failed => Err(ValidationError::invalid_configuration(
                "cannot insert a stage into an assembled job",
            )
            .into()),
        }
    }

    /// Link source, transforms and sink into one chain
    ///
    /// Only the first call does any work. If linking fails, the job cannot be
    /// run.
    pub fn assemble(&mut self) -> Result<()> {
        let (transforms, sink) = match mem::replace(&mut self.assembly, Assembly::Failed) {
            Assembly::Pending { transforms, sink } => (transforms, sink),
            Assembly::Assembled => {
                self.assembly = Assembly::Assembled;
                return Ok(());
            }
            Assembly::Failed => {
                return Err(ValidationError::invalid_configuration(
                    "job assembly failed earlier",
                )
                .into());
            }
        };

        let mut names: Vec<String> = transforms.iter().map(|t| t.name().to_string()).collect();
        names.push(sink.name().to_string());
        self.stage_names = names;

        let mut head = sink;
        for mut stage in transforms.into_iter().rev() {
            stage.set_next(head)?;
            head = stage;
        }
        self.source.set_next(head)?;

        info!("Assembled chain {}", self.describe());
        self.assembly = Assembly::Assembled;
        Ok(())
    }

    /// Whether the chain has been linked
    pub fn is_assembled(&self) -> bool {
        matches!(self.assembly, Assembly::Assembled)
    }

    /// Chain as `source -> stage -> ... -> sink`
    pub fn describe(&self) -> String {
        let mut names = vec![self.source.name().to_string()];
        match &self.assembly {
            Assembly::Pending { transforms, sink } => {
                names.extend(transforms.iter().map(|t| t.name().to_string()));
                names.push(sink.name().to_string());
            }
            Assembly::Assembled | Assembly::Failed => names.extend(self.stage_names.clone()),
        }
        names.join(" -> ")
    }

    /// Run a single listing and transfer pass
    pub fn run_once(&mut self) -> Result<CycleSummary> {
        self.assemble()?;
        self.cycle(None)
    }

    /// Run cycles forever, sleeping `interval` between them
    ///
    /// Only an assembly failure returns.
    pub fn run(&mut self, interval: Duration) -> Result<()> {
        self.run_until(interval, &StopSignal::new())
    }

    /// Run cycles until `stop` is raised
    ///
    /// The signal is checked between items and while sleeping; an item in
    /// flight always completes.
    pub fn run_until(&mut self, interval: Duration, stop: &StopSignal) -> Result<()> {
        self.assemble()?;
        info!("Starting job {} every {interval:?}", self.describe());

        while !stop.is_stopped() {
            match self.cycle(Some(stop)) {
                Ok(summary) if summary.is_clean() => debug!(
                    "Cycle complete: {} listed, {} delivered",
                    summary.listed,
                    summary.delivered.len()
                ),
                Ok(summary) => warn!(
                    "Cycle complete: {} listed, {} delivered, {} failed",
                    summary.listed,
                    summary.delivered.len(),
                    summary.failed.len()
                ),
                Err(e) => error!("{e}"),
            }

            sleep_unless_stopped(interval, stop);
        }

        info!("Job {} stopped", self.describe());
        Ok(())
    }

    fn cycle(&mut self, stop: Option<&StopSignal>) -> Result<CycleSummary> {
        let source_name = self.source.name().to_string();
        info!("Listing items in {source_name}");
        let names = self
            .source
            .list()
            .map_err(|e| TransferError::listing(&source_name, e))?;

        let mut summary = CycleSummary {
            listed: names.len(),
            ..CycleSummary::default()
        };

        for name in names {
            if stop.is_some_and(StopSignal::is_stopped) {
                info!("Stop requested, leaving remaining items in {source_name}");
                summary.interrupted = true;
                break;
            }

            info!("Processing {name}");
            match self.source.process(&name) {
                Ok(()) => {
                    info!("Completed {name}");
                    summary.delivered.push(name);
                }
                Err(e) => {
                    let cleanup = e.is_retirement_failure();
                    if cleanup {
                        error!("Transfer of {name} went through but cleanup failed: {e}");
                    } else {
                        error!("Failed to process {name}: {e}");
                    }
                    summary.failed.push(ItemFailure {
                        error: e.to_string(),
                        retryable: e.is_retryable(),
                        cleanup,
                        name,
                    });
                }
            }
        }

        Ok(summary)
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("chain", &self.describe())
            .field("assembled", &self.is_assembled())
            .finish()
    }
}

fn sleep_unless_stopped(interval: Duration, stop: &StopSignal) {
    let deadline = Instant::now() + interval;
    while !stop.is_stopped() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(STOP_POLL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Content, NextProcessor};
    use crate::connectors::MemorySource;
    use crate::error::IoError;
    use crate::Error;
    use std::io::Read;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    type Seen = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

    #[derive(Debug, Default)]
    struct Collect {
        seen: Seen,
        reject: Option<&'static str>,
    }

    impl Processor for Collect {
        fn name(&self) -> &str {
            "collect"
        }

        fn process(&mut self, name: &str, mut content: Content<'_>) -> Result<()> {
            if self.reject == Some(name) {
                return Err(Error::stage("collect", name, std::io::Error::other("rejected")));
            }
            let mut data = Vec::new();
            content.read_to_end(&mut data)?;
            self.seen.lock().unwrap().push((name.to_string(), data));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Suffix {
        suffix: &'static str,
        next: NextProcessor,
    }

    impl Suffix {
        fn boxed(suffix: &'static str) -> Box<dyn Processor> {
            Box::new(Self {
                suffix,
                next: NextProcessor::new(),
            })
        }
    }

    impl Processor for Suffix {
        fn name(&self) -> &str {
            self.suffix
        }

        fn process(&mut self, name: &str, content: Content<'_>) -> Result<()> {
            self.next.forward(&format!("{name}{}", self.suffix), content)
        }

        fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
            self.next.set(self.suffix, next)
        }
    }

    #[derive(Debug)]
    struct Unlistable;

    impl Source for Unlistable {
        fn name(&self) -> &str {
            "unlistable"
        }

        fn list(&mut self) -> Result<Vec<String>> {
            Err(IoError::file_not_found(std::path::Path::new("/nowhere")).into())
        }

        fn process(&mut self, _name: &str) -> Result<()> {
            unreachable!("nothing is listed")
        }

        fn set_next(&mut self, _next: Box<dyn Processor>) -> Result<()> {
            Ok(())
        }
    }

    /// Fails its first listing, then raises `stop`
    #[derive(Debug)]
    struct FlakyListing {
        calls: Arc<AtomicUsize>,
        stop: StopSignal,
    }

    impl Source for FlakyListing {
        fn name(&self) -> &str {
            "flaky"
        }

        fn list(&mut self) -> Result<Vec<String>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(IoError::file_not_found(std::path::Path::new("/nowhere")).into());
            }
            self.stop.stop();
            Ok(Vec::new())
        }

        fn process(&mut self, _name: &str) -> Result<()> {
            unreachable!("nothing is listed")
        }

        fn set_next(&mut self, _next: Box<dyn Processor>) -> Result<()> {
            Ok(())
        }
    }

    fn memory_job(items: &[(&str, &str)], sink: Collect) -> Job {
        let mut source = MemorySource::new();
        for (name, data) in items {
            source.insert(*name, *data);
        }
        Job::new(Box::new(source), Box::new(sink))
    }

    #[test]
    fn test_stages_run_in_insertion_order() {
        let sink = Collect::default();
        let seen = sink.seen.clone();
        let mut job = memory_job(&[("a", "1")], sink);
        job.insert(Suffix::boxed(".x")).unwrap();
        job.insert(Suffix::boxed(".y")).unwrap();

        let summary = job.run_once().unwrap();

        assert_eq!(summary.delivered, vec!["a"]);
        assert_eq!(seen.lock().unwrap()[0].0, "a.x.y");
        assert_eq!(job.describe(), "memory -> .x -> .y -> collect");
    }

    #[test]
    fn test_assemble_is_idempotent_and_freezes_chain() {
        let mut job = memory_job(&[], Collect::default());
        job.assemble().unwrap();
        job.assemble().unwrap();

        assert!(job.is_assembled());
        assert!(job.insert(Suffix::boxed(".late")).is_err());
    }

    #[test]
    fn test_sink_in_transform_position_fails_assembly() {
        let mut job = memory_job(&[], Collect::default());
        job.insert(Box::new(Collect::default())).unwrap();

        assert!(job.assemble().is_err());
        assert!(job.run_once().is_err());
        assert_eq!(job.describe(), "memory -> collect -> collect");
    }

    #[test]
    fn test_item_failure_is_recorded_not_returned() {
        let sink = Collect {
            reject: Some("bad"),
            ..Collect::default()
        };
        let seen = sink.seen.clone();
        let mut job = memory_job(&[("bad", "x"), ("good", "y")], sink);

        let summary = job.run_once().unwrap();

        assert_eq!(summary.listed, 2);
        assert_eq!(summary.delivered, vec!["good"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].name, "bad");
        assert!(summary.failed[0].retryable);
        assert!(!summary.failed[0].cleanup);
        assert_eq!(seen.lock().unwrap().len(), 1);

        let retry = job.run_once().unwrap();
        assert_eq!(retry.listed, 1);
    }

    #[test]
    fn test_listing_failure_aborts_cycle() {
        let mut job = Job::new(Box::new(Unlistable), Box::new(Collect::default()));
        let err = job.run_once().unwrap_err();

        assert!(matches!(err, Error::Transfer(TransferError::Listing { .. })));
        assert!(err.to_string().contains("unlistable"));
    }

    #[test]
    fn test_run_until_returns_once_stopped() {
        let stop = StopSignal::new();
        stop.stop();
        let mut job = memory_job(&[("a", "1")], Collect::default());

        job.run_until(Duration::from_secs(3600), &stop).unwrap();
        assert!(job.is_assembled());
    }

    #[test]
    fn test_run_until_continues_after_listing_failure() {
        let stop = StopSignal::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FlakyListing {
            calls: calls.clone(),
            stop: stop.clone(),
        };
        let mut job = Job::new(Box::new(source), Box::new(Collect::default()));

        job.run_until(Duration::from_millis(10), &stop).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stop_signal_interrupts_sleep() {
        let stop = StopSignal::new();
        let remote = stop.clone();
        let started = Instant::now();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.stop();
        });
        sleep_unless_stopped(Duration::from_secs(30), &stop);
        handle.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
