use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use super::config::DiagnosticsConfig;
use super::request::Batch;

#[derive(Serialize)]
struct ExportRecord<'a> {
    sequence: u64,
    batch: &'a Batch,
}

/// Request tracing and batch export.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    config: DiagnosticsConfig,
    sequence: u64,
}

impl Diagnostics {
    pub(crate) fn new(config: DiagnosticsConfig) -> Self {
        Self {
            config,
            sequence: 0,
        }
    }

    /// Runs the enabled diagnostics for `batch`. Export failures are logged.
    pub(crate) fn inspect(&mut self, batch: &Batch) {
        if !self.config.is_enabled() {
            return;
        }
        let sequence = self.sequence;
        self.sequence += 1;

        if self.config.verbose {
            log::info!("batch {sequence}: {} request(s)", batch.len());
            for (i, request) in batch.iter().enumerate() {
                log::info!("  [{i}] {request}");
            }
        }

        if let Some(path) = &self.config.export_path {
            if let Err(e) = export_batch(path, sequence, batch) {
                log::warn!("failed exporting batch {sequence} to {}: {e:#}", path.display());
            }
        }
    }
}

/// Appends one batch as a JSON line to `path`.
pub(crate) fn export_batch(path: &Path, sequence: u64, batch: &Batch) -> anyhow::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, &ExportRecord { sequence, batch })?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
