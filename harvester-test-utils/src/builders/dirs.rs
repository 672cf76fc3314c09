//! Temporary directory layout for local transfers

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// `to_load`, `loaded`, `transmit` and `out` directories under one temp root
///
/// Everything is removed when the value is dropped.
pub struct TransferDirs {
    root: TempDir,
    pub to_load: PathBuf,
    pub loaded: PathBuf,
    pub transmit: PathBuf,
    pub out: PathBuf,
}

impl TransferDirs {
    /// Create the layout
    pub fn new() -> io::Result<Self> {
        let root = TempDir::new()?;
        let dirs = Self {
            to_load: root.path().join("to_load"),
            loaded: root.path().join("loaded"),
            transmit: root.path().join("transmit"),
            out: root.path().join("out"),
            root,
        };
        for dir in [&dirs.to_load, &dirs.loaded, &dirs.transmit, &dirs.out] {
            fs::create_dir_all(dir)?;
        }
        Ok(dirs)
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Drop a file into `to_load`
    pub fn add_file(&self, name: &str, data: &[u8]) -> io::Result<PathBuf> {
        let path = self.to_load.join(name);
        fs::write(&path, data)?;
        Ok(path)
    }

    /// Sorted file names in `dir`
    pub fn names_in(dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
