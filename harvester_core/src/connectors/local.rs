//! Local filesystem connectors
//!
//! The reader picks files up from a `to_load` directory. Sinks first write into
//! a `transmit` directory and only move the finished file into its delivery
//! directory afterwards, so consumers never see a half-written file.

mod reader;
mod writer;

pub use reader::{FileReader, Retirement};
pub use writer::{Archiver, FileWriter};

use crate::{
    Result,
    audit::{AuditReport, Auditor},
    chain::Content,
    error::{IoError, TransferError},
};
use log::{error, info, warn};
use std::fs::{self, File};
use std::path::Path;

/// Write `content` to `transmit_path`, then move it to `final_path`
///
/// A failed copy removes the partial file. A failed move removes the written
/// file and is reported as [`TransferError::Finalize`], which is distinct from
/// a copy failure.
fn deliver(
    content: &mut Content<'_>,
    transmit_path: &Path,
    final_path: &Path,
    auditor: &Auditor,
) -> Result<AuditReport> {
    info!("Creating file {}", transmit_path.display());
    let mut file =
        File::create(transmit_path).map_err(|e| IoError::at("create file", transmit_path, e))?;

    let copied = auditor.copy(&mut file, content).and_then(|report| {
        file.sync_all()
            .map_err(|e| IoError::at("sync file", transmit_path, e))?;
        Ok(report)
    });
    drop(file);

    let report = match copied {
        Ok(report) => report,
        Err(err) => {
            error!("Error while copying to {}: {err}", transmit_path.display());
            remove_partial(transmit_path);
            return Err(err);
        }
    };

    info!(
        "Moving {} to {}",
        transmit_path.display(),
        final_path.display()
    );
    if let Err(e) = fs::rename(transmit_path, final_path) {
        error!(
            "Error while moving {} to {}: {e}",
            transmit_path.display(),
            final_path.display()
        );
        remove_partial(transmit_path);
        return Err(TransferError::finalize(transmit_path, final_path, e).into());
    }

    Ok(report)
}

fn remove_partial(path: &Path) {
    info!("Removing {}", path.display());
    if let Err(e) = fs::remove_file(path) {
        warn!("Unable to remove {}: {e}", path.display());
    }
}
