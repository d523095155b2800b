//! `packwatch run` command handler

use std::io::Write;

use colored::Colorize;
use tracing::info;

use packwatch_core::config::PackwatchConfig;
use packwatch_tracker::{CycleOutcome, CycleReport, DeliveryOutcome};

use crate::cli::RunArgs;
use crate::commands::build_tracker;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// An unusable upstream payload is reported and exits successfully;
/// store failures propagate as `CliError::Core` and exit with code 3.
pub async fn execute(
    args: RunArgs,
    config: &PackwatchConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let tracker = build_tracker(config)?;

    info!(
        unit = %config.tracker.unit_code,
        dry_run = args.dry_run,
        notify = tracker.notifications_enabled(),
        "starting cycle"
    );

    let outcome = if args.dry_run {
        tracker.preview().await?
    } else {
        tracker.run_cycle().await?
    };

    writer.render(&outcome)?;
    Ok(())
}

impl Render for CycleOutcome {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match self {
            CycleOutcome::Completed(report) => render_report(report, w),
            CycleOutcome::Invalid { cycle_id, reason } => {
                writeln!(w, "Cycle {}", cycle_id.bold())?;
                writeln!(
                    w,
                    "  Result: {} (inventory API probably down, nothing changed)",
                    "INVALID".yellow().bold()
                )?;
                writeln!(w, "  Reason: {reason}")
            }
        }
    }
}

fn render_report(report: &CycleReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "Cycle {} (unit {}, key {})",
        report.cycle_id.bold(),
        report.unit_code,
        report.key
    )?;
    writeln!(w, "  Previous: {}", report.previous)?;
    writeln!(w, "  Current:  {}", report.snapshot)?;

    if report.delta.is_empty() {
        writeln!(w, "  New:      {}", report.delta)?;
    } else {
        writeln!(w, "  New:      {}", report.delta.to_string().green().bold())?;
    }

    if report.persisted {
        writeln!(w, "  Stored:   yes")?;
    } else {
        writeln!(w, "  Stored:   no (dry run)")?;
    }

    if !report.deliveries.is_empty() {
        writeln!(w, "  Notifications:")?;
        for delivery in &report.deliveries {
            match &delivery.outcome {
                DeliveryOutcome::Sent { sid } => {
                    writeln!(w, "    {:<16} {} ({sid})", delivery.recipient, "SENT".green())?;
                }
                DeliveryOutcome::Failed { reason } => {
                    writeln!(
                        w,
                        "    {:<16} {} {}",
                        delivery.recipient,
                        "FAILED".red().bold(),
                        reason.red()
                    )?;
                }
            }
        }
    }

    Ok(())
}
