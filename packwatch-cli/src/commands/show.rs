//! `packwatch show` command handler

use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use packwatch_core::config::PackwatchConfig;
use packwatch_tracker::Snapshot;

use crate::commands::build_tracker;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `show` command.
pub async fn execute(config: &PackwatchConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let tracker = build_tracker(config)?;
    let key = tracker.state_key();
    info!(key = %key, "reading stored state");

    let state = tracker.stored_state().await?;
    let report = StoredStateReport {
        unit_code: config.tracker.unit_code.clone(),
        key,
        total: state.total(),
        state,
    };

    writer.render(&report)?;
    Ok(())
}

/// Stored package counts for the tracked unit.
#[derive(Serialize)]
pub struct StoredStateReport {
    /// Tracked unit code
    pub unit_code: String,
    /// Store key
    pub key: String,
    /// Vendor => count
    pub state: Snapshot,
    /// Sum of all counts
    pub total: u64,
}

impl Render for StoredStateReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "Stored state for unit {} (key {})",
            self.unit_code.bold(),
            self.key
        )?;

        if self.state.is_empty() {
            writeln!(w, "  (no record)")?;
            return Ok(());
        }

        writeln!(w, "  {:<24} {:>6}", "VENDOR", "COUNT")?;
        for (vendor, count) in self.state.iter() {
            writeln!(w, "  {vendor:<24} {count:>6}")?;
        }
        writeln!(w, "  {:<24} {:>6}", "total", self.total)?;
        Ok(())
    }
}
