//! REB Parser - extract seismic events from REB bulletin text reports.
//!
//! This crate provides:
//! - Detection of the old and new REB bulletin layouts
//! - A line-driven record parser that keeps events inside a geographic
//!   region and reported by at least one chosen station
//! - Batch processing of bulletin directory trees with per-file error isolation
//!
//! # Example
//!
//! ```rust,no_run
//! use reb_parser::{DirectoryProcessor, Region, StationCatalog, load_stations};
//!
//! let stations = load_stations("resources/stations.json").expect("Failed to load stations");
//! let catalog = StationCatalog::select(&stations, &["NVAR"]).expect("Unknown station");
//! let region = Region::Box { lat_max: 36.0, lat_min: 25.0, long_min: -46.0, long_max: -35.0 };
//!
//! let mut processor = DirectoryProcessor::new(region, catalog);
//! processor.process_directories("bulletins").expect("Failed to process");
//!
//! for event in processor.get_events() {
//!     println!("{}", event);
//! }
//! ```

pub mod config;
pub mod dialect;
pub mod event;
pub mod export;
pub mod parser;
pub mod processor;
pub mod region;
pub mod station;
pub mod stats;

pub use config::Config;
pub use dialect::{Dialect, DialectRules, detect_dialect, detect_file_dialect};
pub use event::Event;
pub use export::{OutputFormat, write_events, write_events_to_file};
pub use parser::{FileParseError, ParseOutcome, ReportParser, parse_report, parse_report_file};
pub use processor::{
    BatchReport, DirectoryProcessor, FileStatus, ProcessError, is_candidate_file,
    process_directory, process_file,
};
pub use region::Region;
pub use station::{AreaShape, ConfigError, Station, StationCatalog, TestingArea, load_stations};
pub use stats::{RecordTally, RunStats, StatsSummary};
