//! Upload boundary for completed-session summaries.
//!
//! The real HTTP backend lives outside this workspace; the core only
//! needs somewhere to hand a `SessionReport`. Uploads are fire-and-forget
//! relative to local persistence: a sink failure is logged and dropped,
//! never propagated back into the session or analysis path.

use fitts_core::SessionReport;
use std::io::Write;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
    #[error("upload rejected: {0}")]
    Rejected(String),
}

pub trait UploadSink {
    fn upload(&mut self, report: &SessionReport) -> Result<(), UploadError>;
}

/// Sends a report through the sink, swallowing failures.
pub fn send_report(sink: &mut dyn UploadSink, report: &SessionReport) {
    match sink.upload(report) {
        Ok(()) => info!(level = %report.level, "session report uploaded"),
        Err(err) => warn!(level = %report.level, %err, "session report upload failed"),
    }
}

/// Writes one JSON object per report, newline terminated. Stands in for
/// the HTTP client during local runs and tests.
pub struct JsonLineSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> UploadSink for JsonLineSink<W> {
    fn upload(&mut self, report: &SessionReport) -> Result<(), UploadError> {
        serde_json::to_writer(&mut self.writer, report)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Discards every report.
pub struct NullSink;

impl UploadSink for NullSink {
    fn upload(&mut self, _report: &SessionReport) -> Result<(), UploadError> {
        Ok(())
    }
}
