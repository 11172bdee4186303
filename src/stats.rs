//! Statistics for a bulletin processing run.
//!
//! [`RecordTally`] counts what happened to the records of a single file;
//! [`RunStats`] aggregates tallies and file outcomes across a whole batch and
//! renders a summary report.

use chrono::NaiveDate;
use hdrhistogram::Histogram;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::AddAssign;
use std::time::{Duration, Instant};

use crate::dialect::Dialect;
use crate::event::Event;

/// Record-level counters for one parsed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordTally {
    /// Lines read from the file (the scan ends at `STOP`).
    pub lines_scanned: u64,
    /// Bytes read from the file.
    pub bytes_scanned: u64,
    /// `EVENT` headers that opened a record.
    pub records_started: u64,
    /// Records abandoned because another `EVENT` header arrived first.
    pub records_restarted: u64,
    /// Records whose origin fell outside the region.
    pub records_outside_region: u64,
    /// Records completed without a corroborating station.
    pub records_uncorroborated: u64,
    /// Records still open at end of file.
    pub records_unterminated: u64,
    /// Records turned into events.
    pub events_accepted: u64,
}

impl AddAssign for RecordTally {
    fn add_assign(&mut self, other: Self) {
        self.lines_scanned += other.lines_scanned;
        self.bytes_scanned += other.bytes_scanned;
        self.records_started += other.records_started;
        self.records_restarted += other.records_restarted;
        self.records_outside_region += other.records_outside_region;
        self.records_uncorroborated += other.records_uncorroborated;
        self.records_unterminated += other.records_unterminated;
        self.events_accepted += other.events_accepted;
    }
}

/// Statistics collector for a batch run.
#[derive(Debug)]
pub struct RunStats {
    pub files_processed: u64,
    pub files_skipped: u64,
    pub files_failed: u64,

    /// Record counters summed over every processed file.
    pub records: RecordTally,

    /// Lines per accepted record
    record_lines: Histogram<u64>,

    /// Processed files per layout
    files_by_dialect: HashMap<Dialect, u64>,

    /// Corroborations per station
    station_hits: HashMap<String, u64>,

    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,

    start_time: Instant,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            files_processed: 0,
            files_skipped: 0,
            files_failed: 0,
            records: RecordTally::default(),
            // Auto-resizing histogram, 3 significant figures
            record_lines: Histogram::new(3).expect("3 significant figures is a valid precision"),
            files_by_dialect: HashMap::new(),
            station_hits: HashMap::new(),
            first_date: None,
            last_date: None,
            start_time: Instant::now(),
        }
    }

    /// Record a successfully processed file and the events it contributed.
    pub fn record_processed(&mut self, dialect: Option<Dialect>, tally: RecordTally, events: &[Event]) {
        self.files_processed += 1;
        self.records += tally;

        if let Some(dialect) = dialect {
            *self.files_by_dialect.entry(dialect).or_insert(0) += 1;
        }

        for event in events {
            let lines = event.raw_text.lines().count() as u64;
            let _ = self.record_lines.record(lines.max(1));

            for station in &event.corroborating_stations {
                *self.station_hits.entry(station.clone()).or_insert(0) += 1;
            }

            if let Some(date) = event.calendar_date() {
                self.first_date = Some(self.first_date.map_or(date, |d| d.min(date)));
                self.last_date = Some(self.last_date.map_or(date, |d| d.max(date)));
            }
        }
    }

    pub fn record_skipped(&mut self) {
        self.files_skipped += 1;
    }

    pub fn record_failed(&mut self) {
        self.files_failed += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Generate a summary report.
    pub fn summary(&self) -> StatsSummary {
        let record_lines = (!self.record_lines.is_empty()).then(|| LinePercentiles {
            p50: self.record_lines.value_at_quantile(0.50),
            p90: self.record_lines.value_at_quantile(0.90),
            p99: self.record_lines.value_at_quantile(0.99),
            min: self.record_lines.min(),
            max: self.record_lines.max(),
            mean: self.record_lines.mean(),
        });

        let files_by_dialect = self
            .files_by_dialect
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();

        // Top 10 stations, ties broken by name for stable output
        let mut top_stations: Vec<_> = self
            .station_hits
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        top_stations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_stations.truncate(10);

        StatsSummary {
            elapsed_secs: self.elapsed().as_secs_f64(),
            files_processed: self.files_processed,
            files_skipped: self.files_skipped,
            files_failed: self.files_failed,
            records: self.records,
            record_lines,
            files_by_dialect,
            top_stations,
            first_date: self.first_date,
            last_date: self.last_date,
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentile values for accepted record lengths.
#[derive(Debug, Clone, Serialize)]
pub struct LinePercentiles {
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub elapsed_secs: f64,
    pub files_processed: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
    pub records: RecordTally,
    pub record_lines: Option<LinePercentiles>,
    pub files_by_dialect: HashMap<String, u64>,
    pub top_stations: Vec<(String, u64)>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "═══════════════════════════════════════════════════════")?;
        writeln!(f, "                  REB RUN STATISTICS")?;
        writeln!(f, "═══════════════════════════════════════════════════════")?;
        writeln!(f)?;
        writeln!(f, "Runtime: {:.2}s", self.elapsed_secs)?;
        writeln!(
            f,
            "Files: {} processed, {} skipped, {} failed",
            self.files_processed, self.files_skipped, self.files_failed
        )?;
        writeln!(
            f,
            "Lines scanned: {} ({} KB)",
            self.records.lines_scanned,
            self.records.bytes_scanned / 1024
        )?;
        writeln!(f)?;

        writeln!(f, "Records:")?;
        writeln!(f, "  Started: {}", self.records.records_started)?;
        writeln!(f, "  Restarted: {}", self.records.records_restarted)?;
        writeln!(f, "  Outside region: {}", self.records.records_outside_region)?;
        writeln!(f, "  Uncorroborated: {}", self.records.records_uncorroborated)?;
        writeln!(f, "  Unterminated: {}", self.records.records_unterminated)?;
        writeln!(f, "  Accepted: {}", self.records.events_accepted)?;
        writeln!(f)?;

        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            writeln!(
                f,
                "Event dates: {} to {}",
                first.format(crate::event::REB_DATE_FORMAT),
                last.format(crate::event::REB_DATE_FORMAT)
            )?;
            writeln!(f)?;
        }

        if let Some(ref p) = self.record_lines {
            writeln!(f, "Record Length (lines):")?;
            writeln!(f, "  Min: {}, Max: {}, Mean: {:.1}", p.min, p.max, p.mean)?;
            writeln!(f, "  P50: {}, P90: {}, P99: {}", p.p50, p.p90, p.p99)?;
            writeln!(f)?;
        }

        if !self.files_by_dialect.is_empty() {
            writeln!(f, "Files by Layout:")?;
            let mut dialects: Vec<_> = self.files_by_dialect.iter().collect();
            dialects.sort();
            for (dialect, count) in dialects {
                writeln!(f, "  {}: {}", dialect, count)?;
            }
            writeln!(f)?;
        }

        if !self.top_stations.is_empty() {
            writeln!(f, "Top Corroborating Stations:")?;
            for (i, (station, count)) in self.top_stations.iter().enumerate() {
                writeln!(f, "  {}. {}: {}", i + 1, station, count)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(date: &str, stations: &[&str]) -> Event {
        Event {
            raw_text: "EVENT 1\nline\nline\n\n\n".to_string(),
            latitude: 30.0,
            longitude: -40.0,
            event_id: "1".to_string(),
            date: date.to_string(),
            corroborating_stations: stations.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_tally_add_assign() {
        let mut total = RecordTally::default();
        let one = RecordTally {
            lines_scanned: 10,
            records_started: 2,
            events_accepted: 1,
            ..Default::default()
        };
        total += one;
        total += one;
        assert_eq!(total.lines_scanned, 20);
        assert_eq!(total.records_started, 4);
        assert_eq!(total.events_accepted, 2);
    }

    #[test]
    fn test_record_file_outcomes() {
        let mut stats = RunStats::new();
        let events = vec![
            make_event("2018/05/03", &["NVAR"]),
            make_event("2003/04/02", &["NVAR", "NVAR"]),
        ];
        let tally = RecordTally {
            events_accepted: 2,
            ..Default::default()
        };

        stats.record_processed(Some(Dialect::New), tally, &events);
        stats.record_skipped();
        stats.record_failed();

        let summary = stats.summary();
        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.records.events_accepted, 2);
        assert_eq!(summary.top_stations, vec![("NVAR".to_string(), 3)]);
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2003, 4, 2));
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2018, 5, 3));
        assert_eq!(summary.files_by_dialect.get("new"), Some(&1));

        let lines = summary.record_lines.expect("histogram has samples");
        assert_eq!(lines.min, 5);
        assert_eq!(lines.max, 5);
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = RunStats::new().summary();
        assert!(summary.record_lines.is_none());
        let text = summary.to_string();
        assert!(text.contains("Files: 0 processed, 0 skipped, 0 failed"));
        assert!(!text.contains("Event dates"));
    }
}
