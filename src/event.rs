//! Accepted seismic events.
//!
//! An [`Event`] keeps the full text of its REB record alongside the fields
//! extracted from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parser::FileParseError;

/// Date format used on REB origin lines, e.g. `2018/05/03`.
pub const REB_DATE_FORMAT: &str = "%Y/%m/%d";

/// A seismic event accepted from a bulletin.
///
/// For a record like:
/// ```text
/// EVENT 15761185 NORTHERN MID-ATLANTIC RIDGE
///    Date       Time        Err   RMS Latitude Longitude ...
/// 2018/05/03 04:12:41.81   0.74  0.68  31.8863  -40.6214 ...
/// ```
/// the event identifier is `15761185` and the date `2018/05/03`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The full record text as read from the bulletin.
    pub raw_text: String,

    pub latitude: f64,

    pub longitude: f64,

    /// Second token of the record's first line.
    pub event_id: String,

    /// First token of the origin line, as written in the bulletin.
    pub date: String,

    /// Catalog stations that reported the event, in record order.
    /// A station listed twice in the record appears twice here.
    pub corroborating_stations: Vec<String>,
}

impl Event {
    /// Build an event from a finished record.
    ///
    /// The identifier comes from the first line. The date is read from line 4
    /// when the first line has exactly two tokens (old layout) and from line 2
    /// otherwise. A record too short for either lookup is an error.
    pub fn from_record(
        raw_text: String,
        latitude: f64,
        longitude: f64,
        corroborating_stations: Vec<String>,
    ) -> Result<Self, FileParseError> {
        let lines: Vec<&str> = raw_text.split('\n').collect();

        let header: Vec<&str> = lines[0].split_whitespace().collect();
        let event_id = header
            .get(1)
            .ok_or(FileParseError::TruncatedRecord { line_index: 0 })?
            .to_string();

        let date_line = if header.len() == 2 { 4 } else { 2 };
        let date = lines
            .get(date_line)
            .and_then(|line| line.split_whitespace().next())
            .ok_or(FileParseError::TruncatedRecord {
                line_index: date_line,
            })?
            .to_string();

        Ok(Self {
            raw_text,
            latitude,
            longitude,
            event_id,
            date,
            corroborating_stations,
        })
    }

    /// The event date as a calendar date, if it is in `YYYY/MM/DD` form.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, REB_DATE_FORMAT).ok()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EVENT {} {} lat {:.4} long {:.4} ({} stations)",
            self.event_id,
            self.date,
            self.latitude,
            self.longitude,
            self.corroborating_stations.len()
        )
    }
}
