//! Record parser for REB bulletins.
//!
//! A bulletin is scanned line by line by a two-state machine. `EVENT` opens
//! a record; the record is closed by three consecutive blank lines or by
//! `STOP`, which also ends the scan of the whole file. While a record is open
//! the parser locates its origin line (where depends on the [`Dialect`]),
//! checks the epicentre against the [`Region`], and then collects the
//! station lines whose first token is in the [`StationCatalog`].
//!
//! ```text
//! EVENT 15761185 NORTHERN MID-ATLANTIC RIDGE
//!    Date       Time        Err   RMS Latitude Longitude ...
//! 2018/05/03 04:12:41.81   0.74  0.68  31.8863  -40.6214 ...
//!
//! Sta     Dist  EvAz Phase ...
//! NVAR   45.12  52.3 P     ...
//! ```
//!
//! An event is emitted only for a record inside the region that names at
//! least one catalog station.

use nom::{IResult, Parser, combinator::all_consuming, number::complete::double};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, trace};

use crate::dialect::{Dialect, DialectRules, OriginTrigger, START_WORD, STOP_WORD};
use crate::event::Event;
use crate::region::Region;
use crate::station::StationCatalog;
use crate::stats::RecordTally;

/// Consecutive blank lines that close a record.
pub const EMPTY_LINES: u32 = 3;

/// Errors that fail the parse of a single file.
#[derive(Debug, Error)]
pub enum FileParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: invalid coordinate '{token}'")]
    InvalidCoordinate { line: usize, token: String },

    #[error("Line {line}: missing token at index {index}")]
    MissingToken { line: usize, index: usize },

    #[error("Record too short: no data at line {line_index}")]
    TruncatedRecord { line_index: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, FileParseError>;

/// Everything a file contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub dialect: Dialect,
    pub events: Vec<Event>,
    pub tally: RecordTally,
}

/// Parse a whole coordinate token such as `-40.6214`.
fn coordinate(input: &str) -> IResult<&str, f64> {
    all_consuming(double).parse(input)
}

fn parse_coordinate(tokens: &[&str], index: usize, line: usize) -> ParseResult<f64> {
    let token = tokens
        .get(index)
        .ok_or(FileParseError::MissingToken { line, index })?;
    coordinate(token)
        .map(|(_, value)| value)
        .map_err(|_| FileParseError::InvalidCoordinate {
            line,
            token: token.to_string(),
        })
}

/// Whether a line counts as blank.
///
/// Takes the line with its (normalized) terminator. Any line of one or two
/// characters is blank, so a stray single character on an otherwise empty
/// line is treated the same as an empty line.
#[inline]
pub fn is_blank_line(line: &str) -> bool {
    matches!(line.chars().count(), 1 | 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Accumulating,
    Stopped,
}

/// Accumulators for the record being read.
#[derive(Debug, Default)]
struct Record {
    raw: String,
    /// Epicentre, once the origin line has been accepted.
    origin: Option<(f64, f64)>,
    lines_until_origin: u32,
    stations: Vec<String>,
}

/// Line-driven REB record parser.
///
/// Feed lines with [`ReportParser::feed_line`] until it returns `false`
/// (the `STOP` marker was seen) or the input ends, then call
/// [`ReportParser::finish`].
pub struct ReportParser<'a> {
    rules: DialectRules,
    region: &'a Region,
    catalog: &'a StationCatalog,
    state: State,
    record: Record,
    blank_run: u32,
    line_no: usize,
    events: Vec<Event>,
    tally: RecordTally,
}

impl<'a> ReportParser<'a> {
    pub fn new(dialect: Dialect, region: &'a Region, catalog: &'a StationCatalog) -> Self {
        Self {
            rules: dialect.rules(),
            region,
            catalog,
            state: State::Idle,
            record: Record::default(),
            blank_run: 0,
            line_no: 0,
            events: Vec::new(),
            tally: RecordTally::default(),
        }
    }

    /// Process one line, terminator included.
    ///
    /// Returns `Ok(false)` once `STOP` has ended the scan; later lines are
    /// ignored.
    pub fn feed_line(&mut self, line: &str) -> ParseResult<bool> {
        if self.state == State::Stopped {
            return Ok(false);
        }

        self.line_no += 1;
        self.tally.lines_scanned += 1;
        self.tally.bytes_scanned += line.len() as u64;

        if self.state == State::Accumulating {
            self.accumulate(line)?;
        } else if line.contains(START_WORD) {
            self.start_record(line);
        }

        Ok(self.state != State::Stopped)
    }

    /// Finish the scan and hand back the accepted events.
    ///
    /// A record still open at end of input is discarded.
    pub fn finish(mut self) -> ParseOutcome {
        if self.state == State::Accumulating {
            debug!("Record open at end of input discarded");
            self.tally.records_unterminated += 1;
        }
        ParseOutcome {
            dialect: self.rules.dialect,
            events: self.events,
            tally: self.tally,
        }
    }

    fn start_record(&mut self, line: &str) {
        self.state = State::Accumulating;
        self.record = Record {
            raw: line.to_string(),
            origin: None,
            lines_until_origin: match self.rules.origin_trigger {
                OriginTrigger::AfterLines(n) => n,
                OriginTrigger::SkipHeader(_) => 0,
            },
            stations: Vec::new(),
        };
        self.blank_run = 0;
        self.tally.records_started += 1;
        trace!("Line {}: record opened", self.line_no);
    }

    fn accumulate(&mut self, line: &str) -> ParseResult<()> {
        // A new header before the current record closed: drop the current one.
        if line.contains(START_WORD) {
            debug!("Line {}: incomplete record abandoned", self.line_no);
            self.tally.records_restarted += 1;
            self.start_record(line);
            return Ok(());
        }

        if line.contains(STOP_WORD) {
            self.record.raw.push_str("\n\n");
            self.complete_record()?;
            self.state = State::Stopped;
            debug!("Line {}: STOP reached", self.line_no);
            return Ok(());
        }

        self.record.raw.push_str(line);

        if is_blank_line(line) {
            self.blank_run += 1;
            if self.blank_run == EMPTY_LINES {
                self.blank_run = 0;
                self.complete_record()?;
                self.state = State::Idle;
            }
            return Ok(());
        }
        self.blank_run = 0;

        if self.record.origin.is_none() {
            return self.seek_origin(line);
        }

        let candidate = line
            .split_whitespace()
            .next()
            .ok_or(FileParseError::MissingToken {
                line: self.line_no,
                index: 0,
            })?;
        if self.catalog.contains(candidate) {
            self.record.stations.push(candidate.to_string());
        }

        Ok(())
    }

    fn seek_origin(&mut self, line: &str) -> ParseResult<()> {
        match self.rules.origin_trigger {
            OriginTrigger::AfterLines(_) => {
                if self.record.lines_until_origin > 0 {
                    self.record.lines_until_origin -= 1;
                    return Ok(());
                }
            }
            OriginTrigger::SkipHeader(header) => {
                if line.contains(header) {
                    return Ok(());
                }
            }
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let latitude = parse_coordinate(&tokens, self.rules.latitude_index, self.line_no)?;
        let longitude = parse_coordinate(&tokens, self.rules.longitude_index, self.line_no)?;

        if self.region.contains(latitude, longitude) {
            self.record.origin = Some((latitude, longitude));
        } else {
            debug!(
                "Line {}: origin ({}, {}) outside region",
                self.line_no, latitude, longitude
            );
            self.tally.records_outside_region += 1;
            self.record = Record::default();
            self.state = State::Idle;
        }

        Ok(())
    }

    /// Emit the open record if it is corroborated, then clear it.
    fn complete_record(&mut self) -> ParseResult<()> {
        let record = std::mem::take(&mut self.record);

        match record.origin {
            Some((latitude, longitude)) if !record.stations.is_empty() => {
                let event = Event::from_record(record.raw, latitude, longitude, record.stations)?;
                debug!(
                    "Line {}: event {} accepted ({} station lines)",
                    self.line_no,
                    event.event_id,
                    event.corroborating_stations.len()
                );
                self.tally.events_accepted += 1;
                self.events.push(event);
            }
            _ => {
                trace!("Line {}: record without corroboration dropped", self.line_no);
                self.tally.records_uncorroborated += 1;
            }
        }

        Ok(())
    }
}

/// Parse a bulletin from a reader under the given layout.
///
/// `\r\n` line endings are normalized to `\n` before each line is handled.
/// Reading stops at `STOP`.
pub fn parse_report<R: BufRead>(
    mut reader: R,
    dialect: Dialect,
    region: &Region,
    catalog: &StationCatalog,
) -> ParseResult<ParseOutcome> {
    let mut parser = ReportParser::new(dialect, region, catalog);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if line.ends_with("\r\n") {
            line.truncate(line.len() - 2);
            line.push('\n');
        }
        if !parser.feed_line(&line)? {
            break;
        }
    }

    Ok(parser.finish())
}

/// Parse a bulletin file. The file is closed on every return path.
pub fn parse_report_file(
    path: &Path,
    dialect: Dialect,
    region: &Region,
    catalog: &StationCatalog,
) -> ParseResult<ParseOutcome> {
    let file = File::open(path)?;
    parse_report(BufReader::new(file), dialect, region, catalog)
}
