//! Writing accepted events out.

use clap::ValueEnum;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::event::Event;

/// Result file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raw REB text of every event, concatenated in result order.
    #[default]
    Text,
    /// JSON array of events.
    Json,
}

/// Write events in the given format.
pub fn write_events<W: Write>(mut writer: W, events: &[Event], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            for event in events {
                writer.write_all(event.raw_text.as_bytes())?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, events)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()
}

/// Write events to a file, replacing any existing content.
pub fn write_events_to_file(path: &Path, events: &[Event], format: OutputFormat) -> io::Result<()> {
    let file = File::create(path)?;
    write_events(BufWriter::new(file), events, format)
}
