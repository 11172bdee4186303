//! Batch processing of bulletin directories.
//!
//! Walks a directory tree, picks out bulletin files by name, detects each
//! file's layout and parses it. A file that cannot be read or parsed is
//! reported as failed and the walk carries on; only a missing or unreadable
//! root aborts the batch.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::dialect::{Dialect, detect_file_dialect};
use crate::event::Event;
use crate::parser::{FileParseError, ParseOutcome, parse_report_file};
use crate::region::Region;
use crate::station::StationCatalog;
use crate::stats::RunStats;

/// Errors that abort a whole batch.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Cannot access directory {path}: {source}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

/// What happened to one file of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    Processed { path: PathBuf, events: usize },
    Skipped { path: PathBuf },
    Failed { path: PathBuf, reason: String },
}

impl FileStatus {
    pub fn path(&self) -> &Path {
        match self {
            FileStatus::Processed { path, .. }
            | FileStatus::Skipped { path }
            | FileStatus::Failed { path, .. } => path,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, FileStatus::Processed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, FileStatus::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileStatus::Failed { .. })
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Processed { path, events } => {
                write!(f, "{} - processed ({} events)", path.display(), events)
            }
            FileStatus::Skipped { path } => write!(f, "{} - skipped", path.display()),
            FileStatus::Failed { path, reason } => {
                write!(f, "{} - failed: {}", path.display(), reason)
            }
        }
    }
}

/// Check whether a path names a bulletin file.
///
/// The full path must contain `txt` and must not contain `ims`.
#[inline]
pub fn is_candidate_file(path: &Path) -> bool {
    let path = path.to_string_lossy();
    path.contains("txt") && !path.contains("ims")
}

/// Detect the layout of one file and parse it.
///
/// A file without any `EVENT` header is parsed under the new layout and
/// yields no events.
pub fn process_file(
    path: &Path,
    region: &Region,
    catalog: &StationCatalog,
) -> Result<ParseOutcome, FileParseError> {
    let dialect = detect_file_dialect(path)?.unwrap_or(Dialect::New);
    parse_report_file(path, dialect, region, catalog)
}

/// Accumulated result of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Accepted events in file-visit order, then in-file order.
    pub events: Vec<Event>,
    /// One entry per file visited, in visit order.
    pub statuses: Vec<FileStatus>,
    pub stats: RunStats,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the outcome of one candidate file into the report.
    pub fn absorb(&mut self, path: PathBuf, result: Result<ParseOutcome, FileParseError>) {
        let status = match result {
            Ok(outcome) => {
                self.stats
                    .record_processed(Some(outcome.dialect), outcome.tally, &outcome.events);
                let events = outcome.events.len();
                self.events.extend(outcome.events);
                FileStatus::Processed { path, events }
            }
            Err(e) => {
                self.stats.record_failed();
                FileStatus::Failed {
                    path,
                    reason: e.to_string(),
                }
            }
        };
        self.push_status(status);
    }

    /// Record a file that did not pass the name filter.
    pub fn skip(&mut self, path: PathBuf) {
        self.stats.record_skipped();
        self.push_status(FileStatus::Skipped { path });
    }

    fn push_status(&mut self, status: FileStatus) {
        if status.is_failed() {
            warn!("{}", status);
        } else {
            info!("{}", status);
        }
        self.statuses.push(status);
    }
}

/// Files before sub-directories, each group by name.
fn visit_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Process every bulletin file under `root`.
///
/// Traversal is depth first and deterministic: within a directory, files
/// are visited in name order before its sub-directories. Files sitting
/// directly in a directory literally named `.` are ignored.
pub fn process_directory(
    root: &Path,
    region: &Region,
    catalog: &StationCatalog,
) -> Result<BatchReport, ProcessError> {
    let metadata = fs::metadata(root).map_err(|source| ProcessError::DirectoryAccess {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ProcessError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    fs::read_dir(root).map_err(|source| ProcessError::DirectoryAccess {
        path: root.to_path_buf(),
        source,
    })?;

    info!("Processing {} with region {}", root.display(), region);

    let mut report = BatchReport::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(visit_order)
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if path.parent().is_some_and(|p| p.as_os_str() == ".") {
            continue;
        }

        if !is_candidate_file(path) {
            report.skip(path.to_path_buf());
            continue;
        }

        let result = process_file(path, region, catalog);
        report.absorb(path.to_path_buf(), result);
    }

    info!(
        "Finished {}: {} events from {} files ({} skipped, {} failed)",
        root.display(),
        report.events.len(),
        report.stats.files_processed,
        report.stats.files_skipped,
        report.stats.files_failed
    );

    Ok(report)
}

/// Two-step front end: run a batch, then fetch its events.
pub struct DirectoryProcessor {
    region: Region,
    catalog: StationCatalog,
    report: BatchReport,
}

impl DirectoryProcessor {
    pub fn new(region: Region, catalog: StationCatalog) -> Self {
        Self {
            region,
            catalog,
            report: BatchReport::new(),
        }
    }

    /// Run the batch over `root`, replacing the results of any previous run.
    pub fn process_directories(&mut self, root: impl AsRef<Path>) -> Result<(), ProcessError> {
        self.report = process_directory(root.as_ref(), &self.region, &self.catalog)?;
        Ok(())
    }

    /// Events accepted by the last run.
    pub fn get_events(&self) -> &[Event] {
        &self.report.events
    }

    /// Per-file outcomes of the last run.
    pub fn file_statuses(&self) -> &[FileStatus] {
        &self.report.statuses
    }

    pub fn stats(&self) -> &RunStats {
        &self.report.stats
    }

    pub fn into_report(self) -> BatchReport {
        self.report
    }
}
