//! Local directory source

use crate::{
    Result,
    chain::{Content, NextProcessor, Processor, Source},
    error::{IoError, TransferError, ValidationError},
    filename::validate_plain_name,
};
use log::{debug, info, warn};
use regex::Regex;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// What happens to a source file once it has been delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retirement {
    /// Delete the file
    Delete,
    /// Move the file into this directory
    MoveTo(PathBuf),
}

/// Reads files from a directory and feeds them into the chain
#[derive(Debug)]
pub struct FileReader {
    label: String,
    to_load: PathBuf,
    retirement: Retirement,
    follow_symlinks: bool,
    filter: Option<Regex>,
    max_files: Option<usize>,
    next: NextProcessor,
}

impl FileReader {
    /// Create a reader for `to_load`
    pub fn new(to_load: impl Into<PathBuf>, retirement: Retirement) -> Self {
        let to_load = to_load.into();
        Self {
            label: format!("local:{}", to_load.display()),
            to_load,
            retirement,
            follow_symlinks: false,
            filter: None,
            max_files: None,
            next: NextProcessor::new(),
        }
    }

    /// Only list files whose name matches `pattern`
    pub fn with_filter(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| ValidationError::invalid_regex(pattern, &e.to_string()))?;
        self.filter = Some(regex);
        Ok(self)
    }

    /// Include symlinks to regular files when listing
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// List at most `max_files` items per cycle
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = Some(max_files);
        self
    }

    /// Directory files are picked up from
    pub fn to_load(&self) -> &Path {
        &self.to_load
    }

    fn is_candidate(&self, entry: &fs::DirEntry) -> bool {
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!("Skipping {}: {e}", entry.path().display());
                return false;
            }
        };

        if file_type.is_dir() {
            return false;
        }

        if file_type.is_symlink() {
            if !self.follow_symlinks {
                debug!("Skipping symlink {}", entry.path().display());
                return false;
            }
            return match fs::metadata(entry.path()) {
                Ok(target) => target.is_file(),
                Err(e) => {
                    warn!("Skipping broken symlink {}: {e}", entry.path().display());
                    false
                }
            };
        }

        true
    }

    fn retire(&self, name: &str, path: &Path) -> Result<()> {
        match &self.retirement {
            Retirement::Delete => {
                info!("Deleting {}", path.display());
                fs::remove_file(path).map_err(|e| TransferError::retirement(path, e))?;
            }
            Retirement::MoveTo(loaded) => {
                let to = loaded.join(name);
                info!("Moving file {} to {}", path.display(), to.display());
                fs::rename(path, &to).map_err(|e| TransferError::retirement(path, e))?;
            }
        }
        Ok(())
    }
}

impl Source for FileReader {
    fn name(&self) -> &str {
        &self.label
    }

    fn list(&mut self) -> Result<Vec<String>> {
        info!("Listing files in {}", self.to_load.display());
        let entries = fs::read_dir(&self.to_load)
            .map_err(|e| IoError::at("list directory", &self.to_load, e))?;

        if let Some(filter) = &self.filter {
            debug!("Filtering files with regex {}", filter.as_str());
        }

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IoError::at("list directory", &self.to_load, e))?;
            if !self.is_candidate(&entry) {
                continue;
            }

            let Ok(name) = entry.file_name().into_string() else {
                warn!("Skipping non UTF-8 file name {:?}", entry.file_name());
                continue;
            };

            if let Some(filter) = &self.filter
                && !filter.is_match(&name)
            {
                warn!("Skipping non-matching file {name}");
                continue;
            }

            names.push(name);
        }

        names.sort();
        if let Some(max_files) = self.max_files {
            names.truncate(max_files);
        }

        info!("Found {} files in {}", names.len(), self.to_load.display());
        Ok(names)
    }

    fn process(&mut self, name: &str) -> Result<()> {
        validate_plain_name(name)?;
        if !self.next.is_linked() {
            return Err(ValidationError::invalid_configuration(&format!(
                "source '{}' has no chain to deliver to",
                self.label
            ))
            .into());
        }

        let path = self.to_load.join(name);
        debug!("Opening {}", path.display());
        let mut file = File::open(&path).map_err(|e| IoError::at("open file", &path, e))?;

        self.next.forward(name, Content::Seekable(&mut file))?;
        drop(file);

        self.retire(name, &path)
    }

    fn set_next(&mut self, next: Box<dyn Processor>) -> Result<()> {
        self.next.set(&self.label, next)
    }
}

impl From<FileReader> for Box<dyn Source> {
    fn from(reader: FileReader) -> Self {
        Box::new(reader)
    }
}
