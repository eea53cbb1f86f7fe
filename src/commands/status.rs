//! Status command - one-shot snapshot of the fleet, no polling.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::commands::render_fleet;
use crate::compose::ComposeCli;
use crate::fleet::SnapshotSource;

/// Print the current (run-state, health) pair for every service.
/// Informational only; the exit code does not reflect fleet health.
pub fn execute(project_dir: PathBuf) -> Result<()> {
    let compose = ComposeCli::new(project_dir)?;
    let fleet = compose
        .fleet_snapshot()
        .context("Could not observe the fleet")?;

    println!("{}", crate::LOGO.cyan());
    println!();
    println!(
        "{} {} service(s) in {}",
        "→".cyan().bold(),
        fleet.len(),
        compose.project_dir().display()
    );
    render_fleet(&fleet);

    if fleet.is_fully_healthy() {
        println!("\n{} Fleet is fully healthy", "✓".green().bold());
    }
    Ok(())
}
