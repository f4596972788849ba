//! Append-only record sinks.

use crate::WhoopError;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Anything a fetch run can deliver records to, in order.
pub trait RecordSink {
    fn append(&mut self, record: &Value) -> Result<(), WhoopError>;
    fn flush(&mut self) -> Result<(), WhoopError>;
}

/// Line terminator written after each record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineFormat {
    /// One JSON value per line.
    #[default]
    JsonLines,
    /// Each value followed by `,\n`, as older exports were written.
    Legacy,
}

impl LineFormat {
    fn terminator(self) -> &'static [u8] {
        match self {
            LineFormat::JsonLines => b"\n",
            LineFormat::Legacy => b",\n",
        }
    }
}

impl FromStr for LineFormat {
    type Err = WhoopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "ndjson" => Ok(LineFormat::JsonLines),
            "legacy" => Ok(LineFormat::Legacy),
            other => Err(WhoopError::Config(format!("unknown sink format: {other}"))),
        }
    }
}

pub struct JsonLinesSink<W: Write> {
    writer: W,
    format: LineFormat,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W, format: LineFormat) -> Self {
        Self {
            writer,
            format,
            written: 0,
        }
    }

    /// Records appended through this sink so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Open `path` for appending, creating it if needed.
    pub fn append_to_file(path: &Path, format: LineFormat) -> Result<Self, WhoopError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn append(&mut self, record: &Value) -> Result<(), WhoopError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(self.format.terminator())?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), WhoopError> {
        self.writer.flush()?;
        Ok(())
    }
}
