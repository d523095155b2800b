//! `packwatch reset` command handler

use std::io::Write;

use serde::Serialize;

use packwatch_core::config::PackwatchConfig;

use crate::commands::build_tracker;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `reset` command.
///
/// Idempotent: clearing a missing record succeeds.
pub async fn execute(config: &PackwatchConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let tracker = build_tracker(config)?;
    tracker.reset().await?;

    writer.render(&ResetReport {
        key: tracker.state_key(),
        cleared: true,
    })?;
    Ok(())
}

/// Result of clearing the stored state.
#[derive(Serialize)]
pub struct ResetReport {
    /// Store key that was cleared
    pub key: String,
    /// Always `true` on success
    pub cleared: bool,
}

impl Render for ResetReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Cleared stored state ({})", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_reset_report() {
        let report = ResetReport {
            key: "packages-4B".to_owned(),
            cleared: true,
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert_eq!(output.trim(), "Cleared stored state (packages-4B)");
    }
}
